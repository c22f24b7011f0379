//! Latency distribution used to schedule deliveries.

use std::sync::Arc;

use rollsim_primitives::rnd_btw;

/// Returns a delivery delay in milliseconds. The default distribution is
/// uniform over `[avg_latency/10, 2*avg_latency]`, matching
/// `simulation.go`'s `network.delay` closure.
pub type DelayFn = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn uniform_delay(avg_latency_ms: i64) -> DelayFn {
    Arc::new(move || rnd_btw(avg_latency_ms / 10, 2 * avg_latency_ms).max(0) as u64)
}
