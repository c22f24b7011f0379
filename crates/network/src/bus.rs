//! The in-process broadcast bus. Every node registers a handle when it
//! joins; every broadcast fans out to *all* registered handles of the
//! matching kind, including the sender's own (spec §4.1: "the reference
//! delivers to all including sender to simplify") — this also means a
//! paired miner/aggregator sharing a `NodeId` each see the other's
//! broadcasts without any special-casing. Each delivery is independently
//! delayed and spawned as its own task (fire-and-forget, no ordering or
//! delivery guarantees), matching `simulation.go`'s `network.broadcast*`
//! helpers.

use std::sync::Arc;

use parking_lot::Mutex;
use rollsim_primitives::NodeId;
use rollsim_state::{Block, L1Tx, L2Tx, Rollup};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::trace;

use crate::delay::DelayFn;
use crate::stats::Stats;

/// Channels a registered L1 miner is reachable on.
#[derive(Clone)]
pub struct L1Handle {
    pub blocks: mpsc::Sender<Arc<Block>>,
    pub txs: mpsc::Sender<L1Tx>,
}

/// Channels a registered L2 aggregator is reachable on.
#[derive(Clone)]
pub struct L2Handle {
    pub rollups: mpsc::Sender<Arc<Rollup>>,
    pub txs: mpsc::Sender<L2Tx>,
}

struct Registry {
    miners: Vec<(NodeId, L1Handle)>,
    aggregators: Vec<(NodeId, L2Handle)>,
}

/// The synthetic network. Constructed once, then every miner/aggregator
/// registers its inbound handle before the simulation starts broadcasting.
/// Cloning is cheap (`Arc`-backed); share one instance across all tasks.
#[derive(Clone)]
pub struct Network {
    delay: DelayFn,
    registry: Arc<Mutex<Registry>>,
    pub stats: Arc<Stats>,
}

impl Network {
    pub fn new(delay: DelayFn) -> Self {
        Self {
            delay,
            registry: Arc::new(Mutex::new(Registry {
                miners: Vec::new(),
                aggregators: Vec::new(),
            })),
            stats: Arc::new(Stats::new()),
        }
    }

    pub fn register_miner(&self, id: NodeId, handle: L1Handle) {
        self.registry.lock().miners.push((id, handle));
    }

    pub fn register_aggregator(&self, id: NodeId, handle: L2Handle) {
        self.registry.lock().aggregators.push((id, handle));
    }

    fn all_miners(&self) -> Vec<L1Handle> {
        self.registry.lock().miners.iter().map(|(_, h)| h.clone()).collect()
    }

    fn all_aggregators(&self) -> Vec<L2Handle> {
        self.registry
            .lock()
            .aggregators
            .iter()
            .map(|(_, h)| h.clone())
            .collect()
    }

    pub fn broadcast_l1_block(&self, origin: NodeId, block: Arc<Block>) {
        for handle in self.all_miners() {
            let delay = self.delay.clone();
            let block = block.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(delay())).await;
                trace!(origin, block = %block.root_hash, "delivering l1 block");
                let _ = handle.blocks.send(block).await;
            });
        }
    }

    pub fn broadcast_l1_tx(&self, origin: NodeId, tx: L1Tx) {
        for handle in self.all_miners() {
            let delay = self.delay.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(delay())).await;
                trace!(origin, tx = %tx.id, "delivering l1 tx");
                let _ = handle.txs.send(tx).await;
            });
        }
    }

    pub fn broadcast_rollup(&self, origin: NodeId, rollup: Arc<Rollup>) {
        for handle in self.all_aggregators() {
            let delay = self.delay.clone();
            let rollup = rollup.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(delay())).await;
                trace!(origin, rollup = %rollup.root_hash, "delivering rollup");
                let _ = handle.rollups.send(rollup).await;
            });
        }
    }

    pub fn broadcast_l2_tx(&self, origin: NodeId, tx: L2Tx) {
        for handle in self.all_aggregators() {
            let delay = self.delay.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                sleep(Duration::from_millis(delay())).await;
                trace!(origin, tx = %tx.id, "delivering l2 tx");
                let _ = handle.txs.send(tx).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollsim_state::Block;

    #[tokio::test(start_paused = true)]
    async fn block_is_delivered_to_every_registered_miner_including_origin() {
        let net = Network::new(Arc::new(|| 5));
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx1b, _rx1b) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        let (tx2b, _rx2b) = mpsc::channel(8);
        net.register_miner(1, L1Handle { blocks: tx1, txs: tx1b });
        net.register_miner(2, L1Handle { blocks: tx2, txs: tx2b });

        net.broadcast_l1_block(1, Block::genesis());
        tokio::time::advance(Duration::from_millis(20)).await;

        assert!(rx1.try_recv().is_ok(), "origin is also delivered to, per spec §4.1");
        assert!(rx2.try_recv().is_ok());
    }
}
