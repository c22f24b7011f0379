//! RNG helpers standing in for the original's `RndBtw`/`generateNonce`.

use rand::Rng;

use crate::ids::Nonce;

/// Returns a pseudo-random integer in `[lo, hi)`, matching `simulation.go`'s
/// `RndBtw`. Callers that pass `lo >= hi` get `lo` back rather than panicking,
/// since several call sites divide by `nr_miners`/`3` and can legitimately
/// produce a degenerate (empty or inverted) range for small configurations.
pub fn rnd_btw(lo: i64, hi: i64) -> i64 {
    if hi <= lo {
        return lo;
    }
    rand::thread_rng().gen_range(lo..hi)
}

/// Fresh tie-break nonce for a newly assembled block or rollup.
pub fn generate_nonce() -> Nonce {
    rand::thread_rng().gen()
}
