//! Simulation driver. Constructs N paired (miner, aggregator) nodes,
//! seeds users, runs the transfer/deposit injectors for a configured
//! duration, then audits invariants and prints a summary — spec §4.5.
//!
//! `main`/`run` split (rather than a bare `#[tokio::main]`) matches
//! `bin/strata-client/src/main.rs`'s pattern of keeping runtime
//! construction and top-level error reporting outside the async body.

mod args;
mod audit;
mod injectors;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use args::SimArgs;
use rollsim_common::LoggerConfig;
use rollsim_consensus_logic::Aggregator;
use rollsim_l1::{Miner, MinerConfig};
use rollsim_network::{delay::uniform_delay, Network};
use rollsim_primitives::{Address, NetworkParams, TxParams};
use rollsim_tasks::ShutdownGuard;
use tracing::info;

fn main() {
    let args = SimArgs::parse();
    if let Err(e) = run(args) {
        eprintln!("FATAL ERROR: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: SimArgs) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(main_inner(args))
}

async fn main_inner(args: SimArgs) -> anyhow::Result<()> {
    let _log_guard = LoggerConfig::new(args.log_file.clone()).init()?;

    let tx_params = TxParams {
        nr_users: args.nr_users as usize,
        ..TxParams::default()
    };
    let network_params = NetworkParams {
        nr_miners: args.nr_miners as usize,
        avg_block_duration_ms: args.avg_block_duration,
        avg_latency_ms: args.avg_latency,
        gossip_period_ms: args.gossip_period,
    };

    let network = Network::new(uniform_delay(network_params.avg_latency_ms));
    let shutdown = ShutdownGuard::new();

    let mut miners = Vec::with_capacity(args.nr_miners as usize);
    let mut aggregators = Vec::with_capacity(args.nr_miners as usize);

    for i in 1..=args.nr_miners {
        let miner_config = MinerConfig {
            avg_block_duration_ms: network_params.avg_block_duration_ms,
            nr_miners: args.nr_miners as i64,
        };
        let (miner, miner_inbox) = Miner::new(i, miner_config, network.clone());
        let (agg, agg_inbox, l1_notify, gossip_agent) =
            Aggregator::new(i, network.clone(), network_params.gossip_period_ms);
        miner.set_aggregator_notify(l1_notify);

        tokio::spawn(gossip_agent.run(shutdown.child()));
        tokio::spawn(miner.clone().run(miner_inbox, shutdown.child()));
        tokio::spawn(agg.clone().run(agg_inbox, shutdown.child()));

        miners.push(miner);
        aggregators.push(agg);
    }

    let users: Arc<Vec<Address>> = Arc::new((0..args.nr_users).map(|_| Address::new()).collect());
    injectors::seed_initial_balances(&network, &users, &tx_params).await;

    tokio::spawn(injectors::run_transfer_injector(
        network.clone(),
        users.clone(),
        tx_params.clone(),
        network_params.avg_block_duration_ms,
        shutdown.child(),
    ));
    tokio::spawn(injectors::run_deposit_injector(
        network.clone(),
        users.clone(),
        tx_params.clone(),
        network_params.avg_block_duration_ms * 2,
        shutdown.child(),
    ));

    info!(
        nr_users = args.nr_users,
        nr_miners = args.nr_miners,
        simulation_time = args.simulation_time,
        "simulation started"
    );
    tokio::time::sleep(Duration::from_secs(args.simulation_time)).await;

    shutdown.shutdown();
    // Grace period for in-flight deliveries and spawned per-head tasks to
    // settle before we read final state (spec §5: timers may fire after
    // shutdown and must degrade gracefully, not that they stop instantly).
    let grace_ms = (network_params.avg_latency_ms.max(10) as u64) * 4;
    tokio::time::sleep(Duration::from_millis(grace_ms)).await;

    let representative = aggregators
        .iter()
        .max_by_key(|agg| agg.observed_head().height)
        .context("no aggregators were constructed")?;

    let report = audit::run_audit(representative).await?;
    print_report(&report, &network);

    Ok(())
}

fn print_report(report: &audit::AuditReport, network: &Network) {
    println!("=== rollsim simulation report ===");
    println!("final L1 height:     {}", report.final_l1_height);
    println!("final L2 height:     {}", report.final_l2_height);
    println!("total balance:       {}", report.total_balance);
    println!(
        "deposits seen:       {} (total amount {})",
        report.deposit_count, report.deposit_total
    );
    println!("duplicate deposits:  {}", report.duplicate_deposits);
    println!("rollups in chain:    {}", report.rollup_count);
    println!("duplicate rollups:   {}", report.duplicate_rollups);
    println!("transfers in chain:  {}", report.transfer_count);
    println!("duplicate transfers: {}", report.duplicate_transfers);
    println!("total L1 reorgs:     {}", network.stats.total_l1_reorgs());
    println!("total L2 reorgs:     {}", network.stats.total_l2_reorgs());
}
