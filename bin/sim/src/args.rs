//! CLI surface: exactly spec §6's six simulation parameters, plus an
//! optional log file path. Parsed with `clap` derive rather than the
//! teacher's `argh`-plus-TOML-override stack, since this binary has no
//! datadir/network config story — see SPEC_FULL.md §10.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "rollsim", about = "Two-layer rollup chain simulator")]
pub struct SimArgs {
    /// Number of simulated users, each seeded with an initial deposit.
    #[arg(long, default_value_t = 10)]
    pub nr_users: u64,

    /// Number of L1 miner/L2 aggregator node pairs.
    #[arg(long, default_value_t = 3)]
    pub nr_miners: u64,

    /// Wall-clock duration of the simulation, in seconds.
    #[arg(long, default_value_t = 10)]
    pub simulation_time: u64,

    /// Average L1 block production time, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub avg_block_duration: i64,

    /// Average network delivery latency, in milliseconds.
    #[arg(long, default_value_t = 50)]
    pub avg_latency: i64,

    /// Gossip-window duration for rollup round election, in milliseconds.
    #[arg(long, default_value_t = 200)]
    pub gossip_period: u64,

    /// Append-only log file. Defaults to stdout-only logging if unset.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
