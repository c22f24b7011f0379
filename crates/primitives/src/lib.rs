//! Generic internal data types shared across the simulator: opaque ids, the
//! node/address namespace, and the RNG helpers that stand in for the
//! original's pseudo-PoW and latency distributions.

pub mod ids;
pub mod params;
pub mod rng;

pub use ids::{Address, BlockId, NodeId, Nonce, RollupId, TxId};
pub use params::{NetworkParams, SimParams, TxParams};
pub use rng::{generate_nonce, rnd_btw};
