//! Shared simulation-wide counters. Guarded by `parking_lot::Mutex` rather
//! than the standard library's (teacher workspace dependency; cheaper,
//! non-poisoning locks for low-contention counters), replacing the
//! original's bare `statsMu sync.Mutex` around a handful of maps.

use std::collections::HashMap;

use parking_lot::Mutex;
use rollsim_primitives::NodeId;

#[derive(Default)]
struct Counters {
    no_l1_reorgs: HashMap<NodeId, u64>,
    no_l2_reorgs: HashMap<NodeId, u64>,
}

/// Cross-node statistics collected during a run. Cheap to clone the handle
/// (an `Arc<Stats>` is what actually gets shared); reads take a snapshot.
#[derive(Default)]
pub struct Stats {
    counters: Mutex<Counters>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_l1_reorg(&self, node: NodeId) {
        let mut c = self.counters.lock();
        *c.no_l1_reorgs.entry(node).or_insert(0) += 1;
    }

    pub fn record_l2_reorg(&self, node: NodeId) {
        let mut c = self.counters.lock();
        *c.no_l2_reorgs.entry(node).or_insert(0) += 1;
    }

    pub fn l1_reorgs(&self, node: NodeId) -> u64 {
        self.counters.lock().no_l1_reorgs.get(&node).copied().unwrap_or(0)
    }

    pub fn l2_reorgs(&self, node: NodeId) -> u64 {
        self.counters.lock().no_l2_reorgs.get(&node).copied().unwrap_or(0)
    }

    pub fn total_l1_reorgs(&self) -> u64 {
        self.counters.lock().no_l1_reorgs.values().sum()
    }

    pub fn total_l2_reorgs(&self) -> u64 {
        self.counters.lock().no_l2_reorgs.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_node() {
        let stats = Stats::new();
        stats.record_l1_reorg(1);
        stats.record_l1_reorg(1);
        stats.record_l1_reorg(2);
        assert_eq!(stats.l1_reorgs(1), 2);
        assert_eq!(stats.l1_reorgs(2), 1);
        assert_eq!(stats.total_l1_reorgs(), 3);
    }

    #[test]
    fn l1_and_l2_counters_are_independent() {
        let stats = Stats::new();
        stats.record_l1_reorg(1);
        stats.record_l2_reorg(1);
        stats.record_l2_reorg(1);
        assert_eq!(stats.l1_reorgs(1), 1);
        assert_eq!(stats.l2_reorgs(1), 2);
        assert_eq!(stats.total_l1_reorgs(), 1);
        assert_eq!(stats.total_l2_reorgs(), 2);
    }
}
