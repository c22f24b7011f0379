//! L1/L2 transactions and the Rollup record.

use std::sync::Arc;

use rollsim_primitives::{Address, BlockId, Nonce, RollupId, TxId};
use uuid::Uuid;

use crate::block::Block;
use crate::state::State;

/// An L1 transaction. There is no signature (Non-goal: no real
/// cryptography); `id` doubles as the dedup key, matching spec §3.
#[derive(Clone, Debug)]
pub struct L1Tx {
    pub id: TxId,
    pub kind: L1TxKind,
}

#[derive(Clone, Debug)]
pub enum L1TxKind {
    Deposit { dest: Address, amount: u64 },
    RollupInclusion { rollup: Arc<Rollup> },
}

impl L1Tx {
    pub fn deposit(dest: Address, amount: u64) -> Self {
        Self {
            id: TxId::new(),
            kind: L1TxKind::Deposit { dest, amount },
        }
    }

    pub fn rollup_inclusion(rollup: Arc<Rollup>) -> Self {
        Self {
            id: TxId::new(),
            kind: L1TxKind::RollupInclusion { rollup },
        }
    }

    pub fn as_deposit(&self) -> Option<(Address, u64)> {
        match &self.kind {
            L1TxKind::Deposit { dest, amount } => Some((*dest, *amount)),
            L1TxKind::RollupInclusion { .. } => None,
        }
    }

    pub fn as_rollup_inclusion(&self) -> Option<&Arc<Rollup>> {
        match &self.kind {
            L1TxKind::RollupInclusion { rollup } => Some(rollup),
            L1TxKind::Deposit { .. } => None,
        }
    }
}

/// An L2 transaction. Transfers move value between two addresses within the
/// rollup state; withdrawals are accepted into rollups but settle outside
/// the simulated state (Non-goal: no L1 settlement bridge), so they only
/// participate in dedup bookkeeping here.
#[derive(Clone, Debug)]
pub struct L2Tx {
    pub id: TxId,
    pub kind: L2TxKind,
    pub from: Address,
    pub dest: Address,
    pub amount: u64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum L2TxKind {
    Transfer,
    Withdrawal,
}

impl L2Tx {
    pub fn transfer(from: Address, dest: Address, amount: u64) -> Self {
        Self {
            id: TxId::new(),
            kind: L2TxKind::Transfer,
            from,
            dest,
            amount,
        }
    }
}

/// Genesis rollups are numbered one below the first real rollup, matching
/// the original's `Rollup{height: -1, ...}` sentinel so that the first
/// rollup built on top of genesis lands at height 0, the same convention L1
/// blocks use.
pub const GENESIS_ROLLUP_HEIGHT: i64 = -1;

/// An immutable L2 rollup. `l1_proof` is the L1 block on which the *parent*
/// rollup was observed included (spec §3) — not the block this rollup
/// itself will eventually ride in, which isn't known until it's broadcast
/// and a miner picks it up.
#[derive(Clone, Debug)]
pub struct Rollup {
    pub root_hash: RollupId,
    pub height: i64,
    pub parent: Option<Arc<Rollup>>,
    pub l1_proof: Arc<Block>,
    pub nonce: Nonce,
    pub txs: Vec<L2Tx>,
    pub state: State,
    /// Monotonic construction order, used only for log/debug output in
    /// place of the original's wall-clock `creationTime` (see SPEC_FULL.md
    /// §3 — real time must never affect consensus outcomes).
    pub seq: u64,
}

impl Rollup {
    pub fn genesis() -> Arc<Rollup> {
        Arc::new(Rollup {
            root_hash: RollupId::from_uuid(Uuid::nil()),
            height: GENESIS_ROLLUP_HEIGHT,
            parent: None,
            l1_proof: Block::genesis(),
            nonce: 0,
            txs: Vec::new(),
            state: State::new(),
            seq: 0,
        })
    }

    pub fn is_genesis(&self) -> bool {
        self.parent.is_none()
    }

    pub fn l1_proof_height(&self) -> u64 {
        self.l1_proof.height
    }

    pub fn l1_proof_id(&self) -> BlockId {
        self.l1_proof.root_hash
    }
}

impl PartialEq for Rollup {
    fn eq(&self, other: &Self) -> bool {
        self.root_hash == other.root_hash
    }
}

impl Eq for Rollup {}
