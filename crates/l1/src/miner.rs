//! The L1 PoW miner. One per simulated miner node: mines pseudo-PoW blocks
//! at a randomized interval, adopts the longest chain it has seen, and
//! notifies its paired aggregator of every new head — mirroring the
//! original's miner/aggregator pairing (`simulation.go`'s `agg.l1 = &miner`)
//! without the raw pointer aliasing, by resolving the back-reference as a
//! channel handle set after construction.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rollsim_network::{L1Handle, Network};
use rollsim_primitives::{generate_nonce, rnd_btw, BlockId, NodeId, TxId};
use rollsim_state::{Block, L1Tx};
use rollsim_tasks::ShutdownGuard;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, trace};

use crate::config::MinerConfig;

/// Inbound channels owned by a miner's event loop. Kept separate from
/// [`Miner`] itself so the struct can be wrapped in an `Arc` and shared with
/// the network registry while the receivers stay exclusively owned by the
/// task that calls [`Miner::run`].
pub struct L1Inbox {
    blocks: mpsc::Receiver<Arc<Block>>,
    txs: mpsc::Receiver<L1Tx>,
}

pub struct Miner {
    id: NodeId,
    config: MinerConfig,
    network: Network,
    head: Mutex<Arc<Block>>,
    included: Mutex<HashSet<TxId>>,
    pending: Mutex<Vec<L1Tx>>,
    aggregator_notify: OnceLock<mpsc::UnboundedSender<Arc<Block>>>,
}

impl Miner {
    /// Constructs the miner and registers its inbound handle with the
    /// network. The paired aggregator's notification channel is wired
    /// separately via [`Miner::set_aggregator_notify`] once it exists,
    /// resolving the constructor cycle the same way
    /// `sync_manager::start_sync_tasks` builds its components before
    /// spawning any task that talks between them.
    pub fn new(id: NodeId, config: MinerConfig, network: Network) -> (Arc<Miner>, L1Inbox) {
        let (block_tx, block_rx) = mpsc::channel(256);
        let (tx_tx, tx_rx) = mpsc::channel(1024);
        network.register_miner(
            id,
            L1Handle {
                blocks: block_tx,
                txs: tx_tx,
            },
        );

        let miner = Arc::new(Miner {
            id,
            config,
            network,
            head: Mutex::new(Block::genesis()),
            included: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
            aggregator_notify: OnceLock::new(),
        });
        let inbox = L1Inbox {
            blocks: block_rx,
            txs: tx_rx,
        };
        (miner, inbox)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn head(&self) -> Arc<Block> {
        self.head.lock().clone()
    }

    /// Wires this miner's head-change notifications to its paired
    /// aggregator. Must be called exactly once before `run`; later calls
    /// are ignored (the slot is load-bearing only for the first wiring).
    pub fn set_aggregator_notify(&self, tx: mpsc::UnboundedSender<Arc<Block>>) {
        let _ = self.aggregator_notify.set(tx);
    }

    /// Submits a user-originated deposit/etc. L1 tx directly into this
    /// miner's own pending pool (as opposed to arriving over the network
    /// from a peer).
    pub fn submit_tx(&self, tx: L1Tx) {
        if !self.included.lock().contains(&tx.id) {
            self.pending.lock().push(tx);
        }
    }

    pub async fn run(self: Arc<Self>, mut inbox: L1Inbox, shutdown: ShutdownGuard) {
        loop {
            let (lo, hi) = self.config.pow_wait_bounds();
            let wait_ms = rnd_btw(lo, hi).max(1) as u64;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(miner = self.id, "miner shutting down");
                    break;
                }
                _ = sleep(Duration::from_millis(wait_ms)) => {
                    self.mine_and_broadcast();
                }
                Some(block) = inbox.blocks.recv() => {
                    self.consider_block(block);
                }
                Some(tx) = inbox.txs.recv() => {
                    if !self.included.lock().contains(&tx.id) {
                        self.pending.lock().push(tx);
                    }
                }
            }
        }
    }

    fn mine_and_broadcast(self: &Arc<Self>) {
        let head = self.head();
        let included = self.included.lock().clone();
        let txs: Vec<L1Tx> = {
            let mut pending = self.pending.lock();
            let (take, keep): (Vec<L1Tx>, Vec<L1Tx>) = pending
                .drain(..)
                .partition(|tx| !included.contains(&tx.id));
            *pending = keep;
            take
        };

        let candidate = Arc::new(Block {
            root_hash: BlockId::new(),
            height: head.height + 1,
            parent: Some(head.clone()),
            miner: self.id,
            nonce: generate_nonce(),
            txs,
        });

        info!(miner = self.id, block = %candidate.root_hash, height = candidate.height, "mined block");
        self.adopt(candidate.clone());
        self.network.broadcast_l1_block(self.id, candidate.clone());
        self.notify_aggregator(candidate);
    }

    /// Longest-chain adoption with a lowest-nonce tie-break at equal height,
    /// matching spec §4.2. Self-mined blocks always extend the current
    /// head, so they always win this comparison; the tie-break only
    /// matters for two peer blocks racing at the same height.
    fn consider_block(self: &Arc<Self>, block: Arc<Block>) {
        let head = self.head();
        if block.root_hash == head.root_hash {
            return;
        }
        let adopt = match block.height.cmp(&head.height) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => block.nonce < head.nonce,
            std::cmp::Ordering::Less => false,
        };
        if adopt {
            trace!(miner = self.id, block = %block.root_hash, height = block.height, "adopting peer block");
            self.adopt(block.clone());
            self.notify_aggregator(block);
        }
    }

    fn adopt(&self, block: Arc<Block>) {
        let included = collect_included(&block);
        *self.included.lock() = included;
        *self.head.lock() = block;
    }

    fn notify_aggregator(&self, block: Arc<Block>) {
        if let Some(tx) = self.aggregator_notify.get() {
            let _ = tx.send(block);
        }
    }
}

fn collect_included(head: &Arc<Block>) -> HashSet<TxId> {
    let mut set = HashSet::new();
    let mut cur = Some(head.clone());
    while let Some(b) = cur {
        for tx in &b.txs {
            set.insert(tx.id);
        }
        cur = b.parent.clone();
    }
    set
}
