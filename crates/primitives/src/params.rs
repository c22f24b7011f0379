//! Simulation-wide configuration, threaded by `Arc` into every component
//! that needs it. Mirrors the shape of the teacher's `Params { rollup, run
//! }` split: `NetworkParams` covers cross-cutting timing knobs, `TxParams`
//! covers the injector's tunables (an ambient addition over the
//! distillation's bare "inject transfers/deposits" prose — see SPEC_FULL.md
//! §2/§4.5).

use serde::{Deserialize, Serialize};

/// Timing parameters shared by the network, miners, and aggregators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkParams {
    /// Number of miner/aggregator pairs.
    pub nr_miners: usize,
    /// Average milliseconds between blocks, system-wide.
    pub avg_block_duration_ms: i64,
    /// Average one-way network latency in milliseconds.
    pub avg_latency_ms: i64,
    /// Gossip window an aggregator waits before picking a round winner.
    pub gossip_period_ms: u64,
}

/// Bounds for the synthetic transaction injectors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TxParams {
    pub nr_users: usize,
    pub initial_balance: u64,
    pub transfer_amount_range: (i64, i64),
    pub deposit_amount_range: (i64, i64),
    pub max_deposits: usize,
}

impl Default for TxParams {
    fn default() -> Self {
        Self {
            nr_users: 0,
            initial_balance: 5000,
            transfer_amount_range: (1, 500),
            deposit_amount_range: (1, 100),
            max_deposits: 1000,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimParams {
    pub network: NetworkParams,
    pub tx: TxParams,
    /// Total wall-clock run time for the simulation, in seconds.
    pub simulation_time_secs: u64,
}
