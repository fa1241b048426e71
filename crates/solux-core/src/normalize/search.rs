//! Search dispatch: query-type detection and result summaries.

use serde::Serialize;
use serde_json::{json, Value};

use crate::params::SearchType;

use super::{at_path, opt_i64_at, u64_at, unwrap_context, TxStatus};

/// What a search resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Transaction,
    Block,
    Address,
    Unknown,
}

/// One search hit with a type-specific summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub id: String,
    pub summary: Value,
    pub confidence: f64,
}

/// The `/search` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: SearchKind,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl SearchResponse {
    /// An empty result set with guidance for the user.
    #[must_use]
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            kind: SearchKind::Unknown,
            results: Vec::new(),
            suggestions: Some(suggestions()),
        }
    }

    #[must_use]
    pub fn hit(query: &str, result: SearchResult) -> Self {
        Self {
            query: query.to_string(),
            kind: result.kind,
            results: vec![result],
            suggestions: None,
        }
    }
}

fn is_base58(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

/// Detects the query type by format: digits are a block slot, base58 of
/// 80-90 characters is a transaction signature, base58 of 32-44 characters
/// is an address. Anything else falls back to address.
#[must_use]
pub fn detect_query_type(query: &str) -> SearchType {
    if !query.is_empty() && query.chars().all(|c| c.is_ascii_digit()) {
        return SearchType::Block;
    }
    if (80..=90).contains(&query.len()) && is_base58(query) {
        return SearchType::Transaction;
    }
    SearchType::Address
}

/// Guidance shown when a search matched nothing.
#[must_use]
pub fn suggestions() -> Vec<String> {
    vec![
        "Try entering a complete transaction signature (88 characters)".to_string(),
        "Try entering a block slot number".to_string(),
        "Try entering a complete Solana address (32-44 characters)".to_string(),
    ]
}

/// Summary for a transaction hit.
#[must_use]
pub fn transaction_summary(signature: &str, raw: &Value) -> SearchResult {
    let meta = at_path(raw, &["meta"]);
    SearchResult {
        kind: SearchKind::Transaction,
        id: signature.to_string(),
        summary: json!({
            "signature": signature,
            "status": TxStatus::from_meta(meta),
            "blockTime": opt_i64_at(raw, "blockTime"),
            "slot": u64_at(raw, "slot"),
            "fee": u64_at(meta, "fee"),
        }),
        confidence: 1.0,
    }
}

/// Summary for a block hit.
#[must_use]
pub fn block_summary(slot: u64, raw: &Value) -> SearchResult {
    SearchResult {
        kind: SearchKind::Block,
        id: slot.to_string(),
        summary: json!({
            "blockhash": raw.get("blockhash").and_then(Value::as_str).unwrap_or_default(),
            "parentSlot": u64_at(raw, "parentSlot"),
            // Transaction count comes from whichever detail level was fetched.
            "transactionCount": raw
                .get("transactions")
                .or_else(|| raw.get("signatures"))
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        }),
        confidence: 1.0,
    }
}

/// Summary for an address hit.
#[must_use]
pub fn address_summary(address: &str, account_raw: &Value) -> SearchResult {
    let account = unwrap_context(account_raw);
    SearchResult {
        kind: SearchKind::Address,
        id: address.to_string(),
        summary: json!({
            "address": address,
            "balance": u64_at(account, "lamports"),
            "isProgram": account.get("executable").and_then(Value::as_bool).unwrap_or(false),
            "owner": account.get("owner").and_then(Value::as_str),
        }),
        confidence: 1.0,
    }
}
