//! The replacement for the original's process-wide `globalDb`: a single
//! `BlockId -> BlockState` map shared by every aggregator, guarded by an
//! async reader/writer lock per spec §5 (readers hold only over the
//! lookup; writers compute the new entry outside the lock and publish it
//! atomically). Grounded on `crates/db/src/stubs/bridge.rs`'s
//! `RwLock<HashMap<..>>`-backed stub store.

use std::collections::HashMap;
use std::sync::Arc;

use rollsim_primitives::BlockId;
use rollsim_state::BlockState;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct StateCache {
    inner: RwLock<HashMap<BlockId, Arc<BlockState>>>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never held across the recursive computation that produces a miss —
    /// callers compute the new state after this returns `None`, then call
    /// [`StateCache::insert`].
    pub async fn get(&self, id: BlockId) -> Option<Arc<BlockState>> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, id: BlockId, state: Arc<BlockState>) -> Arc<BlockState> {
        self.inner.write().await.insert(id, state.clone());
        state
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
