//! Address transaction history normalization.
//!
//! `getSignaturesForAddress` provides the signature list; a bounded number
//! of entries are enriched with full `getTransaction` detail. Enrichment is
//! best-effort per entry: a failed detail lookup degrades that entry to the
//! signature-level fields.

use serde::Serialize;
use serde_json::Value;

use crate::params::{AddressTransactionsQuery, DirectionFilter};
use crate::providers::programs::known_program_name;
use crate::types::Pagination;

use super::block::ProgramInteraction;
use super::{arr_at, at_path, opt_i64_at, str_at, u64_at, TxStatus};

/// Transfer direction relative to the queried address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    Unknown,
}

/// One entry in an address's transaction history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub signature: String,
    pub block_time: Option<i64>,
    pub slot: u64,
    pub status: TxStatus,
    pub confirmation_status: String,
    pub fee: u64,
    pub compute_units_consumed: u64,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub program_interactions: Vec<ProgramInteraction>,
    pub memo: Option<String>,
}

/// Rollup over the whole signature window.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_transactions: usize,
    pub successful_transactions: usize,
    pub failed_transactions: usize,
    pub total_fee_paid: u64,
}

/// The `/addresses/{address}/transactions` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTransactionsPage {
    pub address: String,
    pub transactions: Vec<HistoryEntry>,
    pub pagination: Pagination,
    pub summary: HistorySummary,
}

/// Account keys of a `jsonParsed` transaction message as plain strings.
fn parsed_account_keys(message: &Value) -> Vec<String> {
    arr_at(message, "accountKeys")
        .iter()
        .map(|key| match key {
            Value::String(pubkey) => pubkey.clone(),
            other => str_at(other, "pubkey"),
        })
        .collect()
}

fn direction_of(address: &str, keys: &[String]) -> Direction {
    match keys.first() {
        Some(first) if first == address => Direction::Sent,
        _ if keys.iter().any(|key| key == address) => Direction::Received,
        _ => Direction::Unknown,
    }
}

fn interactions_of(message: &Value, keys: &[String]) -> Vec<ProgramInteraction> {
    arr_at(message, "instructions")
        .iter()
        .filter_map(|ix| {
            let program_id = match ix.get("programId").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => keys.get(u64_at(ix, "programIdIndex") as usize)?.clone(),
            };
            Some(ProgramInteraction {
                program_name: known_program_name(&program_id).map(str::to_string),
                program_id,
            })
        })
        .collect()
}

/// Builds one history entry from its signature info and, when the detail
/// lookup succeeded, the full transaction.
#[must_use]
pub fn history_entry(
    address: &str,
    sig_info: &Value,
    tx_raw: Option<&Value>,
    default_commitment: &str,
) -> HistoryEntry {
    let status = TxStatus::from_meta(sig_info);
    let confirmation_status = {
        let from_info = str_at(sig_info, "confirmationStatus");
        if from_info.is_empty() {
            default_commitment.to_string()
        } else {
            from_info
        }
    };
    let memo = sig_info.get("memo").and_then(Value::as_str).map(str::to_string);

    let Some(tx) = tx_raw.filter(|tx| !tx.is_null()) else {
        return HistoryEntry {
            signature: str_at(sig_info, "signature"),
            block_time: opt_i64_at(sig_info, "blockTime"),
            slot: u64_at(sig_info, "slot"),
            status,
            confirmation_status,
            fee: 0,
            compute_units_consumed: 0,
            direction: Direction::Unknown,
            program_interactions: Vec::new(),
            memo,
        };
    };

    let meta = at_path(tx, &["meta"]);
    let message = at_path(tx, &["transaction", "message"]);
    let keys = parsed_account_keys(message);

    HistoryEntry {
        signature: str_at(sig_info, "signature"),
        block_time: opt_i64_at(tx, "blockTime").or_else(|| opt_i64_at(sig_info, "blockTime")),
        slot: {
            let slot = u64_at(tx, "slot");
            if slot == 0 {
                u64_at(sig_info, "slot")
            } else {
                slot
            }
        },
        status,
        confirmation_status,
        fee: u64_at(meta, "fee"),
        compute_units_consumed: u64_at(meta, "computeUnitsConsumed"),
        direction: direction_of(address, &keys),
        program_interactions: interactions_of(message, &keys),
        memo,
    }
}

/// Assembles the history page: entries, direction/program filters, window
/// rollup, and cursor-style pagination flags.
#[must_use]
pub fn build_history_page(
    address: &str,
    signatures: &[Value],
    details: &[Option<Value>],
    query: &AddressTransactionsQuery,
) -> AddressTransactionsPage {
    let entries: Vec<HistoryEntry> = signatures
        .iter()
        .enumerate()
        .map(|(index, sig_info)| {
            history_entry(
                address,
                sig_info,
                details.get(index).and_then(Option::as_ref),
                query.commitment.as_str(),
            )
        })
        .collect();

    let summary = HistorySummary {
        total_transactions: signatures.len(),
        successful_transactions: signatures
            .iter()
            .filter(|sig| TxStatus::from_meta(sig).is_success())
            .count(),
        failed_transactions: signatures
            .iter()
            .filter(|sig| !TxStatus::from_meta(sig).is_success())
            .count(),
        total_fee_paid: entries.iter().map(|entry| entry.fee).sum(),
    };

    let transactions: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|entry| match query.filter {
            DirectionFilter::All => true,
            DirectionFilter::Sent => entry.direction == Direction::Sent,
            DirectionFilter::Received => entry.direction == Direction::Received,
            DirectionFilter::Program => match &query.program {
                Some(program) => entry
                    .program_interactions
                    .iter()
                    .any(|interaction| interaction.program_id == *program),
                None => !entry.program_interactions.is_empty(),
            },
        })
        .collect();

    AddressTransactionsPage {
        address: address.to_string(),
        transactions,
        pagination: Pagination {
            total: signatures.len(),
            limit: query.limit,
            offset: 0,
            has_next: signatures.len() >= query.limit,
            has_previous: query.before.is_some(),
        },
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Commitment;
    use serde_json::json;

    fn sig_info(signature: &str, failed: bool) -> Value {
        json!({
            "signature": signature,
            "slot": 500,
            "blockTime": 1700000000,
            "err": if failed { json!({"InstructionError": [0, "x"]}) } else { json!(null) },
            "confirmationStatus": "finalized",
            "memo": null
        })
    }

    fn detail(address: &str, fee: u64) -> Value {
        json!({
            "slot": 500,
            "blockTime": 1700000000,
            "meta": {"err": null, "fee": fee, "computeUnitsConsumed": 300},
            "transaction": {"message": {
                "accountKeys": [
                    {"pubkey": address, "signer": true, "writable": true},
                    {"pubkey": "counterparty", "signer": false, "writable": true}
                ],
                "instructions": [
                    {"programId": "11111111111111111111111111111111", "parsed": {"type": "transfer"}}
                ]
            }}
        })
    }

    fn query() -> AddressTransactionsQuery {
        AddressTransactionsQuery {
            limit: 50,
            before: None,
            until: None,
            commitment: Commitment::Confirmed,
            filter: DirectionFilter::All,
            program: None,
        }
    }

    #[test]
    fn enriched_entry_has_direction_and_programs() {
        let entry = history_entry(
            "myAddr",
            &sig_info("sig1", false),
            Some(&detail("myAddr", 5000)),
            "confirmed",
        );

        assert_eq!(entry.direction, Direction::Sent);
        assert_eq!(entry.fee, 5000);
        assert_eq!(entry.confirmation_status, "finalized");
        assert_eq!(entry.program_interactions.len(), 1);
        assert_eq!(entry.program_interactions[0].program_name.as_deref(), Some("System Program"));
    }

    #[test]
    fn failed_detail_degrades_to_signature_fields() {
        let entry = history_entry("myAddr", &sig_info("sig1", true), None, "confirmed");
        assert_eq!(entry.signature, "sig1");
        assert_eq!(entry.status, TxStatus::Failure);
        assert_eq!(entry.fee, 0);
        assert_eq!(entry.direction, Direction::Unknown);
        assert_eq!(entry.slot, 500);
    }

    #[test]
    fn received_direction_when_not_fee_payer() {
        let entry = history_entry(
            "counterparty",
            &sig_info("sig1", false),
            Some(&detail("someoneElse", 100)),
            "confirmed",
        );
        assert_eq!(entry.direction, Direction::Received);
    }

    #[test]
    fn page_summary_counts_whole_window() {
        let signatures = vec![sig_info("a", false), sig_info("b", true), sig_info("c", false)];
        let details =
            vec![Some(detail("addr", 10)), Some(detail("addr", 20)), None];

        let page = build_history_page("addr", &signatures, &details, &query());
        assert_eq!(page.summary.total_transactions, 3);
        assert_eq!(page.summary.successful_transactions, 2);
        assert_eq!(page.summary.failed_transactions, 1);
        assert_eq!(page.summary.total_fee_paid, 30);
        assert_eq!(page.transactions.len(), 3);
    }

    #[test]
    fn direction_filter_applies_after_summary() {
        let signatures = vec![sig_info("a", false), sig_info("b", false)];
        let details = vec![Some(detail("addr", 10)), Some(detail("other", 20))];

        let mut q = query();
        q.filter = DirectionFilter::Sent;
        let page = build_history_page("addr", &signatures, &details, &q);

        assert_eq!(page.transactions.len(), 1);
        assert_eq!(page.transactions[0].signature, "a");
        // Summary still reflects the full window.
        assert_eq!(page.summary.total_transactions, 2);
    }

    #[test]
    fn program_filter_matches_interactions() {
        let signatures = vec![sig_info("a", false)];
        let details = vec![Some(detail("addr", 10))];

        let mut q = query();
        q.filter = DirectionFilter::Program;
        q.program = Some("11111111111111111111111111111111".to_string());
        let page = build_history_page("addr", &signatures, &details, &q);
        assert_eq!(page.transactions.len(), 1);

        q.program = Some("SomeOtherProgram".to_string());
        let page = build_history_page("addr", &signatures, &details, &q);
        assert!(page.transactions.is_empty());
    }

    #[test]
    fn pagination_flags_follow_cursor_semantics() {
        let signatures: Vec<Value> = (0..50).map(|i| sig_info(&format!("s{i}"), false)).collect();
        let details: Vec<Option<Value>> = vec![None; 50];

        let page = build_history_page("addr", &signatures, &details, &query());
        assert!(page.pagination.has_next, "a full window implies more history");
        assert!(!page.pagination.has_previous);

        let mut q = query();
        q.before = Some("cursorSig".to_string());
        let page = build_history_page("addr", &signatures[..10], &details[..10], &q);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);
    }
}
