//! Block/Rollup data model: immutable linked-parent records, the state
//! mapping, and the per-L1-block memoization record (`BlockState`). Kept
//! deliberately free of any networking or consensus-logic dependency so the
//! fork-choice code and the test suite can build chains of these in memory
//! without spinning up any tasks.

pub mod block;
pub mod state;
pub mod tx;

pub use block::{Block, GENESIS_HEIGHT};
pub use state::{BlockState, State};
pub use tx::{L1Tx, L1TxKind, L2Tx, L2TxKind, Rollup, GENESIS_ROLLUP_HEIGHT};
