//! Per-aggregator gossip actor: the single-consumer store of candidate
//! rollups and pending L2 transactions that peers feed into, matching
//! spec §4.3.

pub mod agent;

pub use agent::{GossipAgent, GossipHandle};
