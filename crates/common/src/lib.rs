//! Ambient logging setup shared by the simulation binary.

pub mod logging;

pub use logging::LoggerConfig;
