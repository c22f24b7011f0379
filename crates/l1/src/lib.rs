//! L1 proof-of-work miner. Mines pseudo-PoW blocks at a randomized
//! interval, tracks the longest chain it has observed, and feeds its
//! paired aggregator every new head, matching spec §4.2.

pub mod config;
pub mod miner;

pub use config::MinerConfig;
pub use miner::{L1Inbox, Miner};
