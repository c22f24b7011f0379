//! The per-aggregator gossip actor. A single task owns all gossip state —
//! `rollups_by_height` and the pending L2 tx pool — so there is never any
//! lock contention on them; everyone else talks to it over channels. Shape
//! matches `l2.go`'s `startGossip` loop: one `select!` consuming ingests and
//! request/response query pairs.

use std::collections::HashMap;
use std::sync::Arc;

use rollsim_state::{L2Tx, Rollup};
use rollsim_tasks::ShutdownGuard;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

enum Query {
    RollupsAt(i64, oneshot::Sender<Vec<Arc<Rollup>>>),
    PendingTxs(oneshot::Sender<Vec<L2Tx>>),
}

/// Cloneable front for the gossip actor. Every clone shares the same
/// underlying channels, so any number of callers (the aggregator's main
/// loop, the network delivery tasks) can submit and query concurrently.
#[derive(Clone)]
pub struct GossipHandle {
    rollup_in: mpsc::Sender<Arc<Rollup>>,
    tx_in: mpsc::Sender<L2Tx>,
    query: mpsc::Sender<Query>,
}

impl GossipHandle {
    pub async fn ingest_rollup(&self, rollup: Arc<Rollup>) {
        let _ = self.rollup_in.send(rollup).await;
    }

    pub async fn ingest_tx(&self, tx: L2Tx) {
        let _ = self.tx_in.send(tx).await;
    }

    /// All candidate rollups gossiped in at the given height so far, in
    /// arrival order. Used by round election to find the winner.
    pub async fn rollups_at(&self, height: i64) -> Vec<Arc<Rollup>> {
        let (tx, rx) = oneshot::channel();
        if self.query.send(Query::RollupsAt(height, tx)).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Every L2 tx gossiped in and not yet pruned. Callers are responsible
    /// for filtering out txs already on the chosen L2 head's ancestor chain.
    pub async fn all_pending_txs(&self) -> Vec<L2Tx> {
        let (tx, rx) = oneshot::channel();
        if self.query.send(Query::PendingTxs(tx)).await.is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}

pub struct GossipAgent {
    rollup_rx: mpsc::Receiver<Arc<Rollup>>,
    tx_rx: mpsc::Receiver<L2Tx>,
    query_rx: mpsc::Receiver<Query>,
    rollups_by_height: HashMap<i64, Vec<Arc<Rollup>>>,
    pending_txs: Vec<L2Tx>,
}

impl GossipAgent {
    pub fn new() -> (GossipHandle, GossipAgent) {
        let (rollup_tx, rollup_rx) = mpsc::channel(256);
        let (tx_tx, tx_rx) = mpsc::channel(1024);
        let (query_tx, query_rx) = mpsc::channel(256);
        (
            GossipHandle {
                rollup_in: rollup_tx,
                tx_in: tx_tx,
                query: query_tx,
            },
            GossipAgent {
                rollup_rx,
                tx_rx,
                query_rx,
                rollups_by_height: HashMap::new(),
                pending_txs: Vec::new(),
            },
        )
    }

    pub async fn run(mut self, shutdown: ShutdownGuard) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(rollup) = self.rollup_rx.recv() => {
                    trace!(rollup = %rollup.root_hash, height = rollup.height, "gossip: rollup ingested");
                    self.rollups_by_height.entry(rollup.height).or_default().push(rollup);
                }
                Some(tx) = self.tx_rx.recv() => {
                    self.pending_txs.push(tx);
                }
                Some(query) = self.query_rx.recv() => {
                    match query {
                        Query::RollupsAt(height, reply) => {
                            let rollups = self.rollups_by_height.get(&height).cloned().unwrap_or_default();
                            let _ = reply.send(rollups);
                        }
                        Query::PendingTxs(reply) => {
                            let _ = reply.send(self.pending_txs.clone());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollsim_primitives::Address;
    use rollsim_state::Rollup;

    #[tokio::test]
    async fn rollups_are_retrievable_by_height() {
        let (handle, agent) = GossipAgent::new();
        let shutdown = ShutdownGuard::new();
        let task = tokio::spawn(agent.run(shutdown.clone()));

        let genesis = Rollup::genesis();
        handle.ingest_rollup(genesis.clone()).await;
        tokio::task::yield_now().await;

        let found = handle.rollups_at(genesis.height).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].root_hash, genesis.root_hash);

        shutdown.shutdown();
        let _ = task.await;
    }

    #[tokio::test]
    async fn pending_txs_accumulate_until_queried() {
        let (handle, agent) = GossipAgent::new();
        let shutdown = ShutdownGuard::new();
        let task = tokio::spawn(agent.run(shutdown.clone()));

        let tx = rollsim_state::L2Tx::transfer(Address::new(), Address::new(), 10);
        handle.ingest_tx(tx.clone()).await;
        tokio::task::yield_now().await;

        let txs = handle.all_pending_txs().await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].id, tx.id);

        shutdown.shutdown();
        let _ = task.await;
    }
}
