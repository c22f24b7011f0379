//! The L2 state mapping and the per-L1-block memoization record.

use std::collections::HashMap;
use std::sync::Arc;

use rollsim_primitives::Address;

use crate::tx::Rollup;

/// Mapping from address to balance. Absent key reads as zero; writes create
/// the key. Plain `HashMap` rather than a sparse Merkle/JMT structure since
/// there is no proof system in this simulator (Non-goal: no real
/// cryptography) — the value-typed clone-on-write discipline below is what
/// stands in for a real state-transition function's copy-on-write trie.
pub type State = HashMap<Address, u64>;

/// Reads a balance, defaulting absent entries to zero.
pub fn balance_of(state: &State, addr: &Address) -> u64 {
    *state.get(addr).unwrap_or(&0)
}

/// Per-L1-block memoization record: the canonical L2 head as of observing
/// that L1 block, and the L2 state after applying it. Immutable once
/// published into the state cache; state maps are always copied before
/// mutation rather than mutated in place (spec §3's `BlockState` lifecycle).
#[derive(Clone, Debug)]
pub struct BlockState {
    pub head: Arc<Rollup>,
    pub state: State,
}

impl BlockState {
    pub fn new(head: Arc<Rollup>, state: State) -> Self {
        Self { head, state }
    }

    pub fn total_balance(&self) -> u64 {
        self.state.values().sum()
    }
}
