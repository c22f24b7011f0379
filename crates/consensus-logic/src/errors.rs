//! Typed failure modes for canonical-chain resolution. Grounded on
//! `consensus-logic/src/errors.rs`'s style: one variant per named failure,
//! each `#[error]` message embedding the id that failed. Only invariant
//! violations live here — benign races (stale round filter entries,
//! underflowing transfers, already-included txs) are logged and skipped,
//! never constructed as an `Error`.

use rollsim_primitives::BlockId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The LCA of a forking pair of L1 heads has no cached `BlockState`.
    /// This can only happen if an ancestor of the current head was never
    /// processed, which means the ancestry chain itself is broken — a
    /// fatal invariant violation, not a recoverable race.
    #[error("fork ancestor {0} has no cached block state")]
    MissingForkAncestor(BlockId),

    /// A non-genesis L1 block was reached with no parent pointer set.
    #[error("non-genesis block {0} is missing its parent")]
    MissingParent(BlockId),
}
