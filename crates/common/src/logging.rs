//! Logging setup: a compact stdout layer plus an optional append-only file
//! layer, matching spec §6's "append-only text stream; one line per reorg
//! event and per local winner". The `LoggerConfig` name and the
//! `tracing_subscriber::registry()` + `EnvFilter` + layered `fmt::layer()`
//! shape are grounded on the teacher's `crates/common/src/logging.rs`; the
//! teacher's own `init()` only ever adds its stdout/OpenTelemetry layers and
//! returns `()` — it has no file-writer layer to draw on. The non-blocking
//! append-only file layer (and the `WorkerGuard` its caller must hold) is
//! supplemented from `tracing-appender`, the crate the wider retrieval pack
//! reaches for whenever a log sink other than stdout is needed. OpenTelemetry
//! export itself is dropped (see DESIGN.md): there is no external collector
//! for a standalone simulation binary to talk to.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub struct LoggerConfig {
    log_file: Option<PathBuf>,
}

impl LoggerConfig {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    /// Installs the global subscriber. The returned guard must be held for
    /// the process lifetime — dropping it stops the non-blocking file
    /// writer's background flush thread.
    pub fn init(self) -> anyhow::Result<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let stdout_layer = fmt::layer().with_target(false).compact();

        let Some(path) = self.log_file else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .init();
            return Ok(None);
        };

        let dir: &Path = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = path.file_name().context("log file path has no file name")?;
        let file_appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
        Ok(Some(guard))
    }
}
