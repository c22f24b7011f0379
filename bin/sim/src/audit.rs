//! Final invariant audit, matching spec §4.5 and the testable properties of
//! §8: walk the canonical L1 chain counting deposits and summing balances,
//! walk the canonical L2 chain collecting rollup/transfer ids, and report
//! any duplication.

use anyhow::Context;
use rollsim_consensus_logic::Aggregator;
use rollsim_state::L2TxKind;

#[derive(Debug)]
pub struct AuditReport {
    pub final_l1_height: u64,
    pub final_l2_height: i64,
    pub total_balance: u64,
    pub deposit_count: usize,
    pub deposit_total: u64,
    pub duplicate_deposits: usize,
    pub rollup_count: usize,
    pub duplicate_rollups: usize,
    pub transfer_count: usize,
    pub duplicate_transfers: usize,
}

fn count_duplicates<T: Ord + Clone>(mut ids: Vec<T>) -> usize {
    let total = ids.len();
    ids.sort();
    ids.dedup();
    total - ids.len()
}

pub async fn run_audit(agg: &Aggregator) -> anyhow::Result<AuditReport> {
    let head_block = agg.observed_head();
    let bs = agg
        .ctx()
        .cache
        .get(head_block.root_hash)
        .await
        .context("final l1 head has no cached block state — ancestry invariant broken")?;

    let mut deposit_ids = Vec::new();
    let mut deposit_total: u64 = 0;
    let mut cur = Some(head_block.clone());
    while let Some(b) = cur {
        for tx in &b.txs {
            if let Some((_, amount)) = tx.as_deposit() {
                deposit_ids.push(tx.id);
                deposit_total += amount;
            }
        }
        cur = b.parent.clone();
    }

    let mut rollup_ids = Vec::new();
    let mut transfer_ids = Vec::new();
    let mut cur = Some(bs.head.clone());
    while let Some(r) = cur {
        rollup_ids.push(r.root_hash);
        for tx in &r.txs {
            if tx.kind == L2TxKind::Transfer {
                transfer_ids.push(tx.id);
            }
        }
        cur = r.parent.clone();
    }

    Ok(AuditReport {
        final_l1_height: head_block.height,
        final_l2_height: bs.head.height,
        total_balance: bs.total_balance(),
        deposit_count: deposit_ids.len(),
        deposit_total,
        duplicate_deposits: count_duplicates(deposit_ids),
        rollup_count: rollup_ids.len(),
        duplicate_rollups: count_duplicates(rollup_ids),
        transfer_count: transfer_ids.len(),
        duplicate_transfers: count_duplicates(transfer_ids),
    })
}
