//! Transaction record normalization.
//!
//! Flattens `getTransaction` output: status from `meta.err`, fee and compute
//! units, per-account SOL balance deltas (non-zero only), instructions with
//! `programIdIndex` resolved against `accountKeys`, and raw log lines.

use serde::Serialize;
use serde_json::Value;

use crate::types::Commitment;

use super::{
    arr_at, at_path, opt_i64_at, str_at, string_list, u64_at, unwrap_context, TxStatus,
};

/// An account referenced by a transaction, with its privilege flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeyMeta {
    pub pubkey: String,
    pub signer: bool,
    pub writable: bool,
}

/// One instruction with its program resolved from the account table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionRecord {
    pub program_id: String,
    pub accounts: Vec<u64>,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
}

/// Net SOL movement for one account, emitted only when non-zero.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    pub account: String,
    pub before: u64,
    pub after: u64,
    pub change: i64,
}

/// SPL token movement parsed from `jsonParsed` inner instructions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub source: String,
    pub destination: String,
    pub amount: u64,
    pub mint: String,
    pub decimals: u64,
}

/// Error detail attached to failed transactions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxErrorDetail {
    pub err: Value,
    pub logs: Vec<String>,
}

/// The stable external transaction record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub signature: String,
    pub status: TxStatus,
    pub confirmation_status: String,
    pub block_time: Option<i64>,
    pub slot: u64,
    pub block_height: u64,
    pub fee: u64,
    pub compute_units_consumed: u64,
    pub recent_blockhash: String,
    pub account_keys: Vec<AccountKeyMeta>,
    pub instructions: Vec<InstructionRecord>,
    pub address_table_lookups: Vec<Value>,
    pub signatures: Vec<String>,
    pub balance_changes: Vec<BalanceChange>,
    pub token_transfers: Vec<TokenTransfer>,
    pub logs: Vec<String>,
    pub error: Option<TxErrorDetail>,
}

/// Message-header counts controlling signer/writable derivation.
struct MessageHeader {
    num_required_signatures: usize,
    num_readonly_signed: usize,
    num_readonly_unsigned: usize,
}

impl MessageHeader {
    fn from_value(header: &Value) -> Self {
        Self {
            num_required_signatures: u64_at(header, "numRequiredSignatures") as usize,
            num_readonly_signed: u64_at(header, "numReadonlySignedAccounts") as usize,
            num_readonly_unsigned: u64_at(header, "numReadonlyUnsignedAccounts") as usize,
        }
    }

    fn is_signer(&self, index: usize) -> bool {
        index < self.num_required_signatures
    }

    /// Writable per the message account ordering: signed-writable accounts
    /// come first, then signed-readonly, then unsigned-writable, then
    /// unsigned-readonly.
    fn is_writable(&self, index: usize, total: usize) -> bool {
        if index < self.num_required_signatures {
            index < self.num_required_signatures.saturating_sub(self.num_readonly_signed)
        } else {
            index < total.saturating_sub(self.num_readonly_unsigned)
        }
    }
}

/// Resolves account keys with signer/writable flags.
///
/// With `encoding: "json"` the keys are plain strings; `jsonParsed`
/// responses carry `{pubkey, signer, writable}` objects, which are passed
/// through as-is.
pub(crate) fn message_account_keys(message: &Value) -> Vec<AccountKeyMeta> {
    let raw_keys = arr_at(message, "accountKeys");
    let header = MessageHeader::from_value(at_path(message, &["header"]));
    let total = raw_keys.len();

    raw_keys
        .iter()
        .enumerate()
        .map(|(index, key)| match key {
            Value::String(pubkey) => AccountKeyMeta {
                pubkey: pubkey.clone(),
                signer: header.is_signer(index),
                writable: header.is_writable(index, total),
            },
            other => AccountKeyMeta {
                pubkey: str_at(other, "pubkey"),
                signer: super::bool_at(other, "signer"),
                writable: super::bool_at(other, "writable"),
            },
        })
        .collect()
}

fn pubkey_at(keys: &[AccountKeyMeta], index: usize) -> String {
    keys.get(index).map_or_else(String::new, |key| key.pubkey.clone())
}

/// Reconstructs the instruction list, resolving `programIdIndex` into the
/// account table. Parsed instructions (from `jsonParsed` encoding) keep
/// their `programId` and decoded body.
fn instructions(message: &Value, keys: &[AccountKeyMeta]) -> Vec<InstructionRecord> {
    arr_at(message, "instructions")
        .iter()
        .map(|ix| {
            let program_id = match ix.get("programId").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => pubkey_at(keys, u64_at(ix, "programIdIndex") as usize),
            };
            InstructionRecord {
                program_id,
                accounts: arr_at(ix, "accounts").iter().filter_map(Value::as_u64).collect(),
                data: str_at(ix, "data"),
                parsed: ix.get("parsed").filter(|p| !p.is_null()).cloned(),
            }
        })
        .collect()
}

/// Per-account SOL deltas: `postBalances[i] - preBalances[i]`, emitted only
/// for non-zero changes with a resolvable account key.
#[must_use]
pub fn balance_changes(meta: &Value, keys: &[AccountKeyMeta]) -> Vec<BalanceChange> {
    let pre = arr_at(meta, "preBalances");
    let post = arr_at(meta, "postBalances");

    pre.iter()
        .zip(post)
        .enumerate()
        .filter_map(|(index, (before, after))| {
            let before = before.as_u64()?;
            let after = after.as_u64()?;
            let change = i64::try_from(after).ok()?.checked_sub(i64::try_from(before).ok()?)?;
            if change == 0 {
                return None;
            }
            let account = pubkey_at(keys, index);
            if account.is_empty() {
                return None;
            }
            Some(BalanceChange { account, before, after, change })
        })
        .collect()
}

/// Extracts SPL transfers from `jsonParsed` inner instructions. Instructions
/// without a decoded `parsed.type == "transfer"` body are skipped.
#[must_use]
pub fn token_transfers(meta: &Value) -> Vec<TokenTransfer> {
    let mut transfers = Vec::new();
    for inner in arr_at(meta, "innerInstructions") {
        for ix in arr_at(inner, "instructions") {
            let parsed = at_path(ix, &["parsed"]);
            if parsed.get("type").and_then(Value::as_str) != Some("transfer") {
                continue;
            }
            let info = at_path(parsed, &["info"]);
            let amount = info
                .get("amount")
                .and_then(|a| a.as_str().and_then(|s| s.parse().ok()).or_else(|| a.as_u64()))
                .unwrap_or(0);
            transfers.push(TokenTransfer {
                source: str_at(info, "source"),
                destination: str_at(info, "destination"),
                amount,
                mint: info
                    .get("mint")
                    .and_then(Value::as_str)
                    .unwrap_or("SOL")
                    .to_string(),
                decimals: info.get("decimals").and_then(Value::as_u64).unwrap_or(9),
            });
        }
    }
    transfers
}

/// Normalizes a `getTransaction` result into the external record.
///
/// `block_height` comes from a best-effort secondary lookup and defaults to
/// `0` when unavailable.
#[must_use]
pub fn normalize_transaction(
    signature: &str,
    raw: &Value,
    commitment: Commitment,
    block_height: u64,
) -> TransactionRecord {
    let meta = at_path(raw, &["meta"]);
    let message = at_path(raw, &["transaction", "message"]);
    let status = TxStatus::from_meta(meta);
    let keys = message_account_keys(message);
    let logs = string_list(meta, "logMessages");

    TransactionRecord {
        signature: signature.to_string(),
        status,
        confirmation_status: commitment.as_str().to_string(),
        block_time: opt_i64_at(raw, "blockTime"),
        slot: u64_at(raw, "slot"),
        block_height,
        fee: u64_at(meta, "fee"),
        compute_units_consumed: u64_at(meta, "computeUnitsConsumed"),
        recent_blockhash: str_at(message, "recentBlockhash"),
        instructions: instructions(message, &keys),
        address_table_lookups: arr_at(message, "addressTableLookups").to_vec(),
        signatures: string_list(at_path(raw, &["transaction"]), "signatures"),
        balance_changes: balance_changes(meta, &keys),
        token_transfers: token_transfers(meta),
        error: (!status.is_success()).then(|| TxErrorDetail {
            err: meta.get("err").cloned().unwrap_or(Value::Null),
            logs: logs.clone(),
        }),
        logs,
        account_keys: keys,
    }
}

/// Unwraps a `getBlock` secondary lookup into a block height, `0` when the
/// call failed or the field is missing.
#[must_use]
pub fn block_height_of(raw: Option<&Value>) -> u64 {
    raw.map_or(0, |block| u64_at(unwrap_context(block), "blockHeight"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_transaction() -> Value {
        json!({
            "slot": 123456,
            "blockTime": 1700000000,
            "meta": {
                "err": null,
                "fee": 5000,
                "computeUnitsConsumed": 2100,
                "preBalances": [1000000, 500000, 1],
                "postBalances": [994000, 506000, 1],
                "logMessages": ["Program 11111111111111111111111111111111 invoke [1]"]
            },
            "transaction": {
                "signatures": ["sigOne"],
                "message": {
                    "recentBlockhash": "FhashXYZ",
                    "header": {
                        "numRequiredSignatures": 1,
                        "numReadonlySignedAccounts": 0,
                        "numReadonlyUnsignedAccounts": 1
                    },
                    "accountKeys": ["senderKey", "receiverKey", "11111111111111111111111111111111"],
                    "instructions": [
                        {"programIdIndex": 2, "accounts": [0, 1], "data": "3Bxs4h24hBtQy9rw"}
                    ]
                }
            }
        })
    }

    #[test]
    fn successful_transaction_normalizes() {
        let record = normalize_transaction("sigOne", &sample_transaction(), Commitment::Confirmed, 100);

        assert_eq!(record.status, TxStatus::Success);
        assert_eq!(record.fee, 5000);
        assert_eq!(record.compute_units_consumed, 2100);
        assert_eq!(record.slot, 123456);
        assert_eq!(record.block_height, 100);
        assert_eq!(record.recent_blockhash, "FhashXYZ");
        assert!(record.error.is_none());
        assert_eq!(record.logs.len(), 1);
    }

    #[test]
    fn failed_transaction_reports_failure_with_detail() {
        let mut raw = sample_transaction();
        raw["meta"]["err"] = json!({"InstructionError": [0, {"Custom": 1}]});

        let record = normalize_transaction("sigOne", &raw, Commitment::Confirmed, 0);
        assert_eq!(record.status, TxStatus::Failure);
        let error = record.error.expect("failed tx must carry error detail");
        assert_eq!(error.err["InstructionError"][0], 0);
        assert_eq!(error.logs, record.logs);
    }

    #[test]
    fn balance_deltas_skip_zero_changes() {
        let raw = sample_transaction();
        let record = normalize_transaction("sigOne", &raw, Commitment::Confirmed, 0);

        assert_eq!(record.balance_changes.len(), 2);
        assert_eq!(record.balance_changes[0].account, "senderKey");
        assert_eq!(record.balance_changes[0].change, -6000);
        assert_eq!(record.balance_changes[1].account, "receiverKey");
        assert_eq!(record.balance_changes[1].change, 6000);
    }

    #[test]
    fn program_id_resolved_from_account_table() {
        let record =
            normalize_transaction("sigOne", &sample_transaction(), Commitment::Confirmed, 0);
        assert_eq!(record.instructions.len(), 1);
        assert_eq!(record.instructions[0].program_id, "11111111111111111111111111111111");
        assert_eq!(record.instructions[0].accounts, vec![0, 1]);
    }

    #[test]
    fn signer_and_writable_flags_follow_header() {
        let record =
            normalize_transaction("sigOne", &sample_transaction(), Commitment::Confirmed, 0);
        let keys = &record.account_keys;
        // Fee payer: signed and writable.
        assert!(keys[0].signer && keys[0].writable);
        // Unsigned writable.
        assert!(!keys[1].signer && keys[1].writable);
        // Program: unsigned readonly.
        assert!(!keys[2].signer && !keys[2].writable);
    }

    #[test]
    fn empty_input_normalizes_to_defaults() {
        let record = normalize_transaction("sig", &json!({}), Commitment::Confirmed, 0);
        assert_eq!(record.status, TxStatus::Success);
        assert_eq!(record.fee, 0);
        assert_eq!(record.slot, 0);
        assert!(record.account_keys.is_empty());
        assert!(record.instructions.is_empty());
        assert!(record.balance_changes.is_empty());
        assert!(record.logs.is_empty());
        assert!(record.block_time.is_none());

        // Every documented field serializes even from empty input.
        let value = serde_json::to_value(&record).unwrap();
        for field in [
            "signature", "status", "confirmationStatus", "blockTime", "slot", "blockHeight",
            "fee", "computeUnitsConsumed", "recentBlockhash", "accountKeys", "instructions",
            "signatures", "balanceChanges", "tokenTransfers", "logs",
        ] {
            assert!(value.get(field).is_some(), "field {field} must be present");
        }
    }

    #[test]
    fn parsed_token_transfers_extracted() {
        let meta = json!({
            "innerInstructions": [{
                "index": 0,
                "instructions": [
                    {
                        "parsed": {
                            "type": "transfer",
                            "info": {
                                "source": "srcAcc",
                                "destination": "dstAcc",
                                "amount": "250",
                                "mint": "mintX",
                                "decimals": 6
                            }
                        }
                    },
                    {"parsed": {"type": "closeAccount", "info": {}}},
                    {"data": "rawUnparsed"}
                ]
            }]
        });

        let transfers = token_transfers(&meta);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount, 250);
        assert_eq!(transfers[0].mint, "mintX");
        assert_eq!(transfers[0].decimals, 6);
    }

    #[test]
    fn block_height_lookup_degrades_to_zero() {
        assert_eq!(block_height_of(None), 0);
        assert_eq!(block_height_of(Some(&json!(null))), 0);
        assert_eq!(block_height_of(Some(&json!({"blockHeight": 250_000_000u64}))), 250_000_000);
    }
}
