//! End-to-end scenarios from spec §8, exercised against a real (if small)
//! node graph rather than the pure `calculate_l2_state` unit tests in
//! `chain_transition.rs`. Uses short real-time durations instead of
//! `tokio::time::pause`/`advance` since several independently-sleeping
//! tasks (miner, aggregator round timer) would need hand-scripted
//! advancement to stay in lockstep; real small sleeps keep the scenario
//! readable while still finishing quickly.

use std::sync::Arc;
use std::time::Duration;

use rollsim_consensus_logic::Aggregator;
use rollsim_l1::{Miner, MinerConfig};
use rollsim_network::{delay::uniform_delay, L1Handle, Network};
use rollsim_primitives::{generate_nonce, Address, BlockId};
use rollsim_state::{Block, L1Tx, L2Tx};
use rollsim_tasks::ShutdownGuard;

struct Node {
    network: Network,
    miner: Arc<Miner>,
    aggregator: Arc<Aggregator>,
    shutdown: ShutdownGuard,
}

async fn spin_single_node(avg_block_ms: i64, gossip_period_ms: u64) -> Node {
    let network = Network::new(uniform_delay(5));
    let shutdown = ShutdownGuard::new();
    let (miner, miner_inbox) = Miner::new(
        1,
        MinerConfig {
            avg_block_duration_ms: avg_block_ms,
            nr_miners: 1,
        },
        network.clone(),
    );
    let (agg, agg_inbox, l1_notify, gossip_agent) = Aggregator::new(1, network.clone(), gossip_period_ms);
    miner.set_aggregator_notify(l1_notify);

    tokio::spawn(gossip_agent.run(shutdown.child()));
    tokio::spawn(miner.clone().run(miner_inbox, shutdown.child()));
    tokio::spawn(agg.clone().run(agg_inbox, shutdown.child()));

    Node {
        network,
        miner,
        aggregator: agg,
        shutdown,
    }
}

#[tokio::test]
async fn s1_genesis_single_miner_produces_blocks_with_no_reorgs() {
    let node = spin_single_node(20, 40).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    node.shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let head = node.miner.head();
    assert!(head.height >= 1, "expected at least one block mined");
    assert_eq!(node.network.stats.total_l1_reorgs(), 0);
}

#[tokio::test]
async fn s2_single_transfer_conserves_total_balance() {
    let node = spin_single_node(30, 60).await;
    let u1 = Address::new();
    let u2 = Address::new();

    node.network.broadcast_l1_tx(0, L1Tx::deposit(u1, 5000));
    node.network.broadcast_l1_tx(0, L1Tx::deposit(u2, 5000));
    tokio::time::sleep(Duration::from_millis(150)).await;

    node.network.broadcast_l2_tx(0, L2Tx::transfer(u1, u2, 100));
    tokio::time::sleep(Duration::from_millis(600)).await;

    node.shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let head = node.aggregator.observed_head();
    let bs = node
        .aggregator
        .ctx()
        .cache
        .get(head.root_hash)
        .await
        .expect("final l1 head must be cached");

    assert_eq!(rollsim_state::state::balance_of(&bs.state, &u1), 4900);
    assert_eq!(rollsim_state::state::balance_of(&bs.state, &u2), 5100);
    assert_eq!(bs.total_balance(), 10_000);
}

#[tokio::test]
async fn s3_underfunded_transfer_leaves_balances_unchanged() {
    let node = spin_single_node(30, 60).await;
    let u1 = Address::new();
    let u2 = Address::new();

    node.network.broadcast_l1_tx(0, L1Tx::deposit(u1, 10));
    node.network.broadcast_l1_tx(0, L1Tx::deposit(u2, 10));
    tokio::time::sleep(Duration::from_millis(150)).await;

    node.network.broadcast_l2_tx(0, L2Tx::transfer(u1, u2, 50));
    tokio::time::sleep(Duration::from_millis(600)).await;

    node.shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let head = node.aggregator.observed_head();
    let bs = node
        .aggregator
        .ctx()
        .cache
        .get(head.root_hash)
        .await
        .expect("final l1 head must be cached");

    assert_eq!(rollsim_state::state::balance_of(&bs.state, &u1), 10);
    assert_eq!(rollsim_state::state::balance_of(&bs.state, &u2), 10);
}

#[tokio::test]
async fn s6_deposits_across_blocks_sum_correctly() {
    let node = spin_single_node(25, 50).await;
    let u1 = Address::new();

    node.network.broadcast_l1_tx(0, L1Tx::deposit(u1, 100));
    tokio::time::sleep(Duration::from_millis(80)).await;
    node.network.broadcast_l1_tx(0, L1Tx::deposit(u1, 100));
    tokio::time::sleep(Duration::from_millis(80)).await;
    node.network.broadcast_l1_tx(0, L1Tx::deposit(u1, 100));
    tokio::time::sleep(Duration::from_millis(300)).await;

    node.shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let head = node.aggregator.observed_head();
    let bs = node
        .aggregator
        .ctx()
        .cache
        .get(head.root_hash)
        .await
        .expect("final l1 head must be cached");

    assert_eq!(rollsim_state::state::balance_of(&bs.state, &u1), 300);
}

#[tokio::test]
async fn s4_l1_fork_between_siblings_is_recorded_as_reorg() {
    // avg_block_duration_ms is set far longer than the test's own wall clock
    // so the node's own PoW timer never fires; the fork is forced entirely
    // by broadcasting two hand-built sibling blocks rather than by waiting
    // on two real miners to race, which would make the reorg probabilistic
    // rather than guaranteed within a bounded test.
    let node = spin_single_node(5_000, 200).await;
    let genesis = Block::genesis();

    let block_a = Arc::new(Block {
        root_hash: BlockId::new(),
        height: genesis.height + 1,
        parent: Some(genesis.clone()),
        miner: 10,
        nonce: 100,
        txs: Vec::new(),
    });
    let block_b = Arc::new(Block {
        root_hash: BlockId::new(),
        height: genesis.height + 1,
        parent: Some(genesis.clone()),
        miner: 20,
        nonce: 1, // lower nonce than block_a at the same height wins the tie-break
        txs: Vec::new(),
    });

    node.network.broadcast_l1_block(0, block_a.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(node.miner.head().root_hash, block_a.root_hash, "block_a adopts first");

    node.network.broadcast_l1_block(0, block_b.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    node.shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(
        node.miner.head().root_hash,
        block_b.root_hash,
        "the lower-nonce sibling must win the same-height tie-break"
    );
    assert!(
        node.network.stats.total_l1_reorgs() >= 1,
        "adopting a sibling block at the same height is an L1 fork"
    );
}

#[tokio::test]
async fn s5_round_election_picks_exactly_one_winner_across_peers() {
    // Two aggregators, no paired miners, both fed the very same L1 block
    // directly so each independently proposes a candidate rollup with its
    // own random nonce. Gossip lets each see the other's candidate before
    // its round closes, so `better_rollup`'s deterministic nonce tie-break
    // must make both converge on the same winner — checked by counting
    // submitted inclusions rather than predicting either random nonce.
    let network = Network::new(uniform_delay(5));
    let shutdown = ShutdownGuard::new();

    let (bystander_txs, mut bystander_rx) = tokio::sync::mpsc::channel(64);
    let (bystander_blocks, _bystander_blocks_rx) = tokio::sync::mpsc::channel(8);
    network.register_miner(
        100,
        L1Handle {
            blocks: bystander_blocks,
            txs: bystander_txs,
        },
    );

    let (agg1, inbox1, l1_tx1, gossip1) = Aggregator::new(1, network.clone(), 150);
    let (agg2, inbox2, l1_tx2, gossip2) = Aggregator::new(2, network.clone(), 150);
    tokio::spawn(gossip1.run(shutdown.child()));
    tokio::spawn(gossip2.run(shutdown.child()));
    tokio::spawn(agg1.clone().run(inbox1, shutdown.child()));
    tokio::spawn(agg2.clone().run(inbox2, shutdown.child()));

    let genesis = Block::genesis();
    let shared_block = Arc::new(Block {
        root_hash: BlockId::new(),
        height: genesis.height + 1,
        parent: Some(genesis.clone()),
        miner: 1,
        nonce: generate_nonce(),
        txs: Vec::new(),
    });
    l1_tx1.send(shared_block.clone()).unwrap();
    l1_tx2.send(shared_block.clone()).unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;

    shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let mut winners = 0;
    while let Ok(tx) = bystander_rx.try_recv() {
        if tx.as_rollup_inclusion().is_some() {
            winners += 1;
        }
    }
    assert_eq!(
        winners, 1,
        "exactly one of the two converging candidates must be submitted for l1 inclusion"
    );
}
