//! Block record and block transaction page normalization.
//!
//! Aggregate metrics are computed by summing per-transaction `meta` fields,
//! so the upstream is always queried with full transaction detail; the
//! requested detail level only controls the response shape.

use serde::Serialize;
use serde_json::Value;

use crate::params::{BlockTransactionsQuery, BlockTxSort, SortOrder, StatusFilter, TransactionDetails};
use crate::providers::programs::known_program_name;
use crate::types::Pagination;

use super::transaction::{balance_changes, token_transfers, BalanceChange, TokenTransfer, TxErrorDetail};
use super::{arr_at, at_path, opt_i64_at, opt_u64_at, str_at, string_list, u64_at, TxStatus};

/// Per-transaction summary inside a block record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTxSummary {
    pub signature: String,
    pub status: TxStatus,
    pub fee: u64,
    pub compute_units_consumed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_keys: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_messages: Option<Vec<String>>,
}

/// Validator reward entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardRecord {
    pub pubkey: String,
    pub lamports: i64,
    pub post_balance: u64,
    pub reward_type: String,
    pub commission: Option<u64>,
}

/// Best-effort links to the neighboring produced slots.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub prev_slot: Option<u64>,
    pub next_slot: Option<u64>,
}

/// Aggregate metrics summed over every transaction in the block.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMetrics {
    pub transaction_count: usize,
    pub total_fees: u64,
    pub compute_units_total: u64,
    pub successful_transactions: usize,
    pub failed_transactions: usize,
}

/// The stable external block record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub slot: u64,
    pub blockhash: String,
    pub parent_slot: u64,
    pub block_time: Option<i64>,
    pub block_height: u64,
    pub previous_blockhash: String,
    pub transactions: Vec<BlockTxSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<Vec<RewardRecord>>,
    pub navigation: Navigation,
    pub metrics: BlockMetrics,
}

fn tx_signature(tx: &Value) -> String {
    arr_at(at_path(tx, &["transaction"]), "signatures")
        .first()
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn metrics_of(transactions: &[Value]) -> BlockMetrics {
    let mut metrics = BlockMetrics { transaction_count: transactions.len(), ..Default::default() };
    for tx in transactions {
        let meta = at_path(tx, &["meta"]);
        metrics.total_fees += u64_at(meta, "fee");
        metrics.compute_units_total += u64_at(meta, "computeUnitsConsumed");
        if TxStatus::from_meta(meta).is_success() {
            metrics.successful_transactions += 1;
        } else {
            metrics.failed_transactions += 1;
        }
    }
    metrics
}

fn rewards_of(raw: &Value) -> Vec<RewardRecord> {
    arr_at(raw, "rewards")
        .iter()
        .map(|reward| RewardRecord {
            pubkey: str_at(reward, "pubkey"),
            lamports: opt_i64_at(reward, "lamports").unwrap_or(0),
            post_balance: u64_at(reward, "postBalance"),
            reward_type: {
                let kind = str_at(reward, "rewardType");
                if kind.is_empty() {
                    "unknown".to_string()
                } else {
                    kind
                }
            },
            commission: opt_u64_at(reward, "commission"),
        })
        .collect()
}

/// Normalizes a `getBlock` result (fetched with full transaction detail)
/// into the external record. Navigation links are filled in by the caller
/// from its auxiliary `getBlocks` lookups.
#[must_use]
pub fn normalize_block(
    slot: u64,
    raw: &Value,
    details: TransactionDetails,
    include_rewards: bool,
    navigation: Navigation,
) -> BlockRecord {
    let all_transactions = arr_at(raw, "transactions");
    let metrics = metrics_of(all_transactions);

    let transactions = match details {
        TransactionDetails::None => Vec::new(),
        _ => all_transactions
            .iter()
            .map(|tx| {
                let meta = at_path(tx, &["meta"]);
                let full = details == TransactionDetails::Full;
                BlockTxSummary {
                    signature: tx_signature(tx),
                    status: TxStatus::from_meta(meta),
                    fee: u64_at(meta, "fee"),
                    compute_units_consumed: u64_at(meta, "computeUnitsConsumed"),
                    account_keys: full.then(|| {
                        string_list(at_path(tx, &["transaction", "message"]), "accountKeys")
                    }),
                    log_messages: full.then(|| string_list(meta, "logMessages")),
                }
            })
            .collect(),
    };

    BlockRecord {
        slot,
        blockhash: str_at(raw, "blockhash"),
        parent_slot: u64_at(raw, "parentSlot"),
        block_time: opt_i64_at(raw, "blockTime"),
        block_height: u64_at(raw, "blockHeight"),
        previous_blockhash: str_at(raw, "previousBlockhash"),
        transactions,
        rewards: include_rewards.then(|| rewards_of(raw)),
        navigation,
        metrics,
    }
}

/// One program touched by a transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramInteraction {
    pub program_id: String,
    pub program_name: Option<String>,
}

/// A program ranked by how many page transactions invoked it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProgram {
    pub program_id: String,
    pub name: Option<String>,
    pub count: usize,
    pub percentage: f64,
}

/// Metrics over the returned page of transactions.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub successful_transactions: usize,
    pub failed_transactions: usize,
    pub total_fees: u64,
    pub total_compute_units: u64,
    pub unique_programs: Vec<String>,
    pub top_programs: Vec<TopProgram>,
}

/// One transaction in a block transaction page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTransactionRecord {
    pub signature: String,
    pub index: usize,
    pub status: TxStatus,
    pub fee: u64,
    pub compute_units_consumed: u64,
    pub account_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_messages: Option<Vec<String>>,
    pub balance_changes: Vec<BalanceChange>,
    pub token_transfers: Vec<TokenTransfer>,
    pub program_interactions: Vec<ProgramInteraction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TxErrorDetail>,
}

/// Paginated, filterable view over a block's transactions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTransactionsPage {
    pub slot: u64,
    pub blockhash: String,
    pub block_time: Option<i64>,
    pub block_height: u64,
    pub transactions: Vec<BlockTransactionRecord>,
    pub pagination: Pagination,
    pub metrics: PageMetrics,
}

fn program_interactions(tx: &Value) -> Vec<ProgramInteraction> {
    let message = at_path(tx, &["transaction", "message"]);
    let keys: Vec<&str> =
        arr_at(message, "accountKeys").iter().filter_map(Value::as_str).collect();

    arr_at(message, "instructions")
        .iter()
        .filter_map(|ix| {
            let program_id = match ix.get("programId").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => keys.get(u64_at(ix, "programIdIndex") as usize)?.to_string(),
            };
            Some(ProgramInteraction {
                program_name: known_program_name(&program_id).map(str::to_string),
                program_id,
            })
        })
        .collect()
}

fn sort_key(tx: &Value, sort_by: BlockTxSort, index: usize) -> u64 {
    let meta = at_path(tx, &["meta"]);
    match sort_by {
        BlockTxSort::Index => index as u64,
        BlockTxSort::Fee => u64_at(meta, "fee"),
        BlockTxSort::Compute => u64_at(meta, "computeUnitsConsumed"),
    }
}

/// Builds the page: status filter, sort, offset/limit slice, then
/// per-transaction analysis of the surviving rows.
#[must_use]
pub fn build_transactions_page(
    slot: u64,
    raw: &Value,
    query: &BlockTransactionsQuery,
) -> BlockTransactionsPage {
    let all: Vec<(usize, &Value)> = arr_at(raw, "transactions").iter().enumerate().collect();

    let mut filtered: Vec<(usize, &Value)> = all
        .into_iter()
        .filter(|(_, tx)| {
            let success = TxStatus::from_meta(at_path(tx, &["meta"])).is_success();
            match query.status {
                StatusFilter::All => true,
                StatusFilter::Success => success,
                StatusFilter::Failed => !success,
            }
        })
        .collect();

    filtered.sort_by_key(|(index, tx)| sort_key(tx, query.sort_by, *index));
    if query.sort_order == SortOrder::Desc {
        filtered.reverse();
    }

    let total = filtered.len();
    let page: Vec<(usize, &Value)> =
        filtered.into_iter().skip(query.offset).take(query.limit).collect();

    let mut metrics = PageMetrics::default();
    let mut program_counts: Vec<(String, usize)> = Vec::new();

    let transactions: Vec<BlockTransactionRecord> = page
        .into_iter()
        .map(|(index, tx)| {
            let meta = at_path(tx, &["meta"]);
            let message = at_path(tx, &["transaction", "message"]);
            let status = TxStatus::from_meta(meta);
            let fee = u64_at(meta, "fee");
            let compute = u64_at(meta, "computeUnitsConsumed");

            if status.is_success() {
                metrics.successful_transactions += 1;
            } else {
                metrics.failed_transactions += 1;
            }
            metrics.total_fees += fee;
            metrics.total_compute_units += compute;

            let interactions = program_interactions(tx);
            for interaction in &interactions {
                match program_counts.iter_mut().find(|(id, _)| *id == interaction.program_id) {
                    Some((_, count)) => *count += 1,
                    None => program_counts.push((interaction.program_id.clone(), 1)),
                }
            }

            let keys = super::transaction::message_account_keys(message);
            BlockTransactionRecord {
                signature: tx_signature(tx),
                index,
                status,
                fee,
                compute_units_consumed: compute,
                account_keys: keys.iter().map(|key| key.pubkey.clone()).collect(),
                log_messages: query.include_details.then(|| string_list(meta, "logMessages")),
                balance_changes: balance_changes(meta, &keys),
                token_transfers: token_transfers(meta),
                program_interactions: interactions,
                error: (!status.is_success()).then(|| TxErrorDetail {
                    err: meta.get("err").cloned().unwrap_or(Value::Null),
                    logs: string_list(meta, "logMessages"),
                }),
            }
        })
        .collect();

    program_counts.sort_by(|a, b| b.1.cmp(&a.1));
    metrics.unique_programs = program_counts.iter().map(|(id, _)| id.clone()).collect();
    metrics.top_programs = program_counts
        .into_iter()
        .take(10)
        .map(|(program_id, count)| TopProgram {
            name: known_program_name(&program_id).map(str::to_string),
            program_id,
            count,
            percentage: if total == 0 { 0.0 } else { (count as f64 / total as f64) * 100.0 },
        })
        .collect();

    BlockTransactionsPage {
        slot,
        blockhash: str_at(raw, "blockhash"),
        block_time: opt_i64_at(raw, "blockTime"),
        block_height: u64_at(raw, "blockHeight"),
        transactions,
        pagination: Pagination::page(total, query.limit, query.offset),
        metrics,
    }
}
