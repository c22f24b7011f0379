//! Explicit `Round` object, replacing the original's closure-captured
//! `Schedule(gossipPeriodMs, fn)` callback per spec §9's redesign note: the
//! gossip-window state a fired timer needs is now a plain, inspectable
//! value rather than implicit closure capture.

use std::sync::Arc;

use rollsim_primitives::RollupId;
use rollsim_state::Rollup;

/// One gossip-window round: from the moment a local candidate rollup is
/// broadcast to the moment the owning aggregator re-queries peers and
/// settles on a winner.
#[derive(Clone)]
pub struct Round {
    pub height: i64,
    pub parent_hash: RollupId,
    pub local_candidate: Arc<Rollup>,
    pub gossip_period_ms: u64,
}

impl Round {
    pub fn new(local_candidate: Arc<Rollup>, gossip_period_ms: u64) -> Self {
        let parent_hash = local_candidate
            .parent
            .as_ref()
            .map(|p| p.root_hash)
            .unwrap_or(local_candidate.root_hash);
        Self {
            height: local_candidate.height,
            parent_hash,
            local_candidate,
            gossip_period_ms,
        }
    }
}
