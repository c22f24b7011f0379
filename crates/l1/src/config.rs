/// Per-miner mining parameters, derived once at simulation startup from the
/// CLI's `avg_block_duration` and `nr_miners` (spec §4.2, `simulation.go`
/// lines 47-49: each miner's expected time-to-block scales with the miner
/// count so the *network's* average block time stays close to the
/// configured value regardless of how many miners are racing).
#[derive(Clone, Copy, Debug)]
pub struct MinerConfig {
    pub avg_block_duration_ms: i64,
    pub nr_miners: i64,
}

impl MinerConfig {
    pub fn pow_wait_bounds(&self) -> (i64, i64) {
        let nr = self.nr_miners.max(1);
        (self.avg_block_duration_ms / nr, nr * self.avg_block_duration_ms)
    }
}
