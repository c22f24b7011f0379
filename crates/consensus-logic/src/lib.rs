//! The aggregator core: L1-head-driven canonical L2 chain resolution,
//! rollup production, and round-based leader election. This is the most
//! complex crate in the workspace, grounded throughout on
//! `consensus-logic`'s fork-choice/reorg machinery, generalized from L2
//! rollup-on-L1 fork choice to this simulator's L1-on-L1 PoW fork choice
//! plus an L2-on-L1 state-transition layer above it.

pub mod aggregator;
pub mod chain_transition;
pub mod errors;
pub mod round;
pub mod state_cache;

use std::sync::Arc;

use rollsim_network::{Network, Stats};
use rollsim_primitives::NodeId;
use state_cache::StateCache;

pub use aggregator::{Aggregator, AggregatorInbox};
pub use round::Round;

/// Everything the chain-transition and round-election functions need,
/// bundled so they can take one argument instead of four. Cheap to clone —
/// every field is itself `Arc`-backed or `Copy`.
#[derive(Clone)]
pub struct AggregatorCtx {
    pub node_id: NodeId,
    pub cache: Arc<StateCache>,
    pub network: Network,
    pub stats: Arc<Stats>,
}
