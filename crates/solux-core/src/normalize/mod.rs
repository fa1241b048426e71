//! Per-resource normalization from raw RPC JSON to the external contract.
//!
//! The upstream shape varies across node versions and partial responses;
//! the functions here absorb that variance. Every documented output field
//! is always serialized: missing nested input normalizes to `0`, `[]`,
//! `false`, or `null` — never an absent key.

use serde::Serialize;
use serde_json::Value;

pub mod address;
pub mod block;
pub mod history;
pub mod network;
pub mod search;
pub mod tokens;
pub mod transaction;

/// Transaction outcome derived from the presence of `meta.err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failure,
}

impl TxStatus {
    /// `meta.err` non-null means failure; absent meta counts as success.
    #[must_use]
    pub fn from_meta(meta: &Value) -> Self {
        if meta.get("err").is_some_and(|err| !err.is_null()) {
            TxStatus::Failure
        } else {
            TxStatus::Success
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == TxStatus::Success
    }
}

/// Many Solana RPC responses wrap their payload as `{context, value}`;
/// returns the inner `value` when present, the input otherwise.
#[must_use]
pub fn unwrap_context(v: &Value) -> &Value {
    match v.get("value") {
        Some(inner) if v.get("context").is_some() => inner,
        _ => v,
    }
}

pub(crate) fn str_at(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

pub(crate) fn u64_at(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or(0)
}

pub(crate) fn opt_u64_at(v: &Value, key: &str) -> Option<u64> {
    v.get(key).and_then(Value::as_u64)
}

pub(crate) fn opt_i64_at(v: &Value, key: &str) -> Option<i64> {
    v.get(key).and_then(Value::as_i64)
}

pub(crate) fn bool_at(v: &Value, key: &str) -> bool {
    v.get(key).and_then(Value::as_bool).unwrap_or(false)
}

pub(crate) fn f64_at(v: &Value, key: &str) -> f64 {
    v.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

pub(crate) fn arr_at<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key).and_then(Value::as_array).map_or(&[], Vec::as_slice)
}

pub(crate) fn string_list(v: &Value, key: &str) -> Vec<String> {
    arr_at(v, key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Reads a nested path like `["transaction", "message", "accountKeys"]`.
pub(crate) fn at_path<'a>(v: &'a Value, path: &[&str]) -> &'a Value {
    let mut current = v;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return &Value::Null,
        }
    }
    current
}
