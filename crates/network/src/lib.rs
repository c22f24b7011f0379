//! In-process message bus: the synthetic network the simulation runs over.
//! One operation per message kind, each delivery independently delayed and
//! fire-and-forget, matching spec §4.1.

pub mod bus;
pub mod delay;
pub mod stats;

pub use bus::{L1Handle, L2Handle, Network};
pub use delay::DelayFn;
pub use stats::Stats;
