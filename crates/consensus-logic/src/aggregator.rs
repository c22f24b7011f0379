//! The L2 aggregator. Consumes L1 head notifications from its paired
//! miner, resolves the canonical L2 head via [`crate::chain_transition`],
//! proposes a candidate rollup, and runs a gossip-window round election —
//! spec §4.4's public contract (`on_new_l1_head` here is the channel the
//! main loop consumes rather than a direct method call, since the paired
//! miner notifies asynchronously).
//!
//! Main-loop shape is modeled directly on `l2.go`'s `Start()`: capture the
//! previous head by value, overwrite the tracked head immediately, then
//! spawn a short-lived task for the actual resolution so a burst of heads
//! is never dropped and stale work is naturally pre-empted by fresher
//! heads converging on the same memoized cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use rollsim_gossip::{GossipAgent, GossipHandle};
use rollsim_network::{L2Handle, Network};
use rollsim_primitives::{generate_nonce, NodeId, RollupId};
use rollsim_state::{Block, L1Tx, L2Tx, Rollup};
use rollsim_tasks::ShutdownGuard;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::chain_transition::{better_rollup, calculate_l2_state, collect_l2_tx_ids, execute_l2_txs};
use crate::round::Round;
use crate::state_cache::StateCache;
use crate::AggregatorCtx;

/// Per-head processing phases, kept purely for tracing context (spec
/// §4.4's state machine) — control flow is a single straight-line async
/// function, not a separate driver.
#[derive(Debug, Clone, Copy)]
enum RoundPhase {
    Resolving,
    Proposing,
    AwaitingRoundClose,
    Submitting,
}

pub struct AggregatorInbox {
    l1_head: mpsc::UnboundedReceiver<Arc<Block>>,
    peer_rollups: mpsc::Receiver<Arc<Rollup>>,
    peer_txs: mpsc::Receiver<L2Tx>,
}

pub struct Aggregator {
    id: NodeId,
    ctx: AggregatorCtx,
    gossip: GossipHandle,
    gossip_period_ms: u64,
    observed_head: SyncMutex<Arc<Block>>,
    seq: AtomicU64,
}

impl Aggregator {
    /// Constructs the aggregator, registers its network handle, and spawns
    /// no tasks yet. Returns the aggregator, its inbox, the sender side the
    /// paired miner should be wired to via `Miner::set_aggregator_notify`,
    /// and its gossip actor (to be driven by its own `run` task) — the same
    /// construct-then-wire-then-spawn shape as
    /// `sync_manager::start_sync_tasks`.
    pub fn new(
        id: NodeId,
        network: Network,
        gossip_period_ms: u64,
    ) -> (
        Arc<Aggregator>,
        AggregatorInbox,
        mpsc::UnboundedSender<Arc<Block>>,
        GossipAgent,
    ) {
        let (l1_tx, l1_rx) = mpsc::unbounded_channel();
        let (rollup_tx, rollup_rx) = mpsc::channel(256);
        let (tx_tx, tx_rx) = mpsc::channel(1024);
        network.register_aggregator(
            id,
            L2Handle {
                rollups: rollup_tx,
                txs: tx_tx,
            },
        );

        let (gossip, gossip_agent) = GossipAgent::new();
        let ctx = AggregatorCtx {
            node_id: id,
            cache: Arc::new(StateCache::new()),
            stats: network.stats.clone(),
            network,
        };

        let aggregator = Arc::new(Aggregator {
            id,
            ctx,
            gossip,
            gossip_period_ms,
            observed_head: SyncMutex::new(Block::genesis()),
            seq: AtomicU64::new(1),
        });
        let inbox = AggregatorInbox {
            l1_head: l1_rx,
            peer_rollups: rollup_rx,
            peer_txs: tx_rx,
        };
        (aggregator, inbox, l1_tx, gossip_agent)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ctx(&self) -> &AggregatorCtx {
        &self.ctx
    }

    /// The last L1 block this aggregator has been notified about. Not
    /// necessarily fully resolved yet — its `BlockState` may still be
    /// computing in a spawned task — so callers that need the resolved
    /// state should look it up via `ctx().cache` rather than assuming this
    /// block is already cached.
    pub fn observed_head(&self) -> Arc<Block> {
        self.observed_head.lock().clone()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn run(self: Arc<Self>, mut inbox: AggregatorInbox, shutdown: ShutdownGuard) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!(node = self.id, "aggregator shutting down");
                    break;
                }
                Some(b) = inbox.l1_head.recv() => {
                    let prev = {
                        let mut head = self.observed_head.lock();
                        let prev = head.clone();
                        *head = b.clone();
                        prev
                    };
                    let this = self.clone();
                    tokio::spawn(async move { this.process_block(b, prev).await });
                }
                Some(rollup) = inbox.peer_rollups.recv() => {
                    self.gossip.ingest_rollup(rollup).await;
                }
                Some(tx) = inbox.peer_txs.recv() => {
                    self.gossip.ingest_tx(tx).await;
                }
            }
        }
    }

    async fn process_block(self: Arc<Self>, b: Arc<Block>, prev: Arc<Block>) {
        debug!(node = self.id, phase = ?RoundPhase::Resolving, block = %b.root_hash, "resolving canonical l2 head");
        let bs = match calculate_l2_state(&self.ctx, b.clone(), prev).await {
            Ok(bs) => bs,
            Err(e) => {
                tracing::error!(node = self.id, block = %b.root_hash, error = %e, "fatal: l2 canonical state resolution failed");
                return;
            }
        };
        let new_head = bs.head.clone();

        debug!(node = self.id, phase = ?RoundPhase::Proposing, head = %new_head.root_hash, "proposing candidate rollup");
        let pending = self.gossip.all_pending_txs().await;
        let already_included = collect_l2_tx_ids(&new_head);
        let txs: Vec<L2Tx> = pending
            .into_iter()
            .filter(|t| !already_included.contains(&t.id))
            .collect();

        let mut state = bs.state.clone();
        execute_l2_txs(&txs, &mut state);

        let candidate = Arc::new(Rollup {
            root_hash: RollupId::new(),
            height: new_head.height + 1,
            parent: Some(new_head.clone()),
            l1_proof: b.clone(),
            nonce: generate_nonce(),
            txs,
            state,
            seq: self.next_seq(),
        });

        info!(node = self.id, rollup = %candidate.root_hash, height = candidate.height, "broadcasting candidate rollup");
        self.ctx.network.broadcast_rollup(self.id, candidate.clone());

        let round = Round::new(candidate, self.gossip_period_ms);

        debug!(node = self.id, phase = ?RoundPhase::AwaitingRoundClose, height = round.height, "awaiting round close");
        sleep(Duration::from_millis(round.gossip_period_ms)).await;

        let mut candidates: Vec<Arc<Rollup>> = self
            .gossip
            .rollups_at(round.height)
            .await
            .into_iter()
            .filter(|r| r.parent.as_ref().map(|p| p.root_hash) == Some(round.parent_hash))
            .collect();
        candidates.push(round.local_candidate.clone());

        let winner = candidates
            .into_iter()
            .reduce(|a, b| better_rollup(&a, &b).clone())
            .unwrap_or_else(|| round.local_candidate.clone());

        if winner.root_hash == round.local_candidate.root_hash {
            debug!(node = self.id, phase = ?RoundPhase::Submitting, rollup = %winner.root_hash, "won round, submitting for l1 inclusion");
            self.ctx
                .network
                .broadcast_l1_tx(self.id, L1Tx::rollup_inclusion(winner));
        } else {
            debug!(node = self.id, winner = %winner.root_hash, "lost round to a peer candidate");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollsim_network::delay::uniform_delay;

    #[tokio::test(start_paused = true)]
    async fn genesis_only_head_produces_height_zero_candidate() {
        let network = Network::new(uniform_delay(1));
        let (agg, inbox, l1_tx, gossip_agent) = Aggregator::new(1, network.clone(), 20);
        let shutdown = ShutdownGuard::new();
        let gossip_task = tokio::spawn(gossip_agent.run(shutdown.child()));
        let agg_task = tokio::spawn(agg.clone().run(inbox, shutdown.clone()));

        let genesis = Block::genesis();
        let b1 = Arc::new(Block {
            root_hash: rollsim_primitives::BlockId::new(),
            height: genesis.height + 1,
            parent: Some(genesis.clone()),
            miner: 1,
            nonce: generate_nonce(),
            txs: Vec::new(),
        });
        l1_tx.send(b1).unwrap();

        tokio::time::advance(Duration::from_millis(50)).await;
        tokio::task::yield_now().await;

        shutdown.shutdown();
        let _ = agg_task.await;
        let _ = gossip_task.await;
    }
}
