//! Error taxonomy and HTTP classification.
//!
//! Every handler outcome funnels through [`ApiError`], which owns the
//! mapping from error kind to stable error code and HTTP status. Raw
//! upstream error text is only ever exposed through the `details` field of
//! the envelope, never as the top-level message.

use thiserror::Error;

use crate::params::ParamIssue;
use crate::rpc::RpcError;
use crate::types::ErrorEnvelope;

/// Classified request failure.
///
/// The taxonomy is closed over the statuses the gateway emits:
/// malformed input 400, absent resources 404, rate limiting 429, requests
/// too expensive to satisfy 413, upstream failures 503, everything else 500.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// One or more query parameters failed validation.
    #[error("Invalid query parameters")]
    InvalidParameters(Vec<ParamIssue>),

    /// The transaction signature path segment is malformed.
    #[error("Invalid transaction signature")]
    InvalidSignature(ParamIssue),

    /// The address path segment is malformed.
    #[error("Invalid address format")]
    InvalidAddress(ParamIssue),

    /// The slot path segment is not a non-negative integer.
    #[error("Invalid slot number")]
    InvalidSlot(ParamIssue),

    /// The `{network}` path segment names no configured network.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Block not found")]
    BlockNotFound,

    /// The slot was skipped or pruned; no block will ever exist for it.
    #[error("Slot {0} is not available")]
    SlotNotAvailable(u64),

    #[error("Token mint not found")]
    TokenNotFound,

    /// No analytics provider is configured to answer this request.
    #[error("Analytics data unavailable")]
    AnalyticsUnavailable,

    /// The upstream is rate limiting us; the caller should back off.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The address has too much history to enumerate; narrow the request.
    #[error("Address has too many transactions to process")]
    AddressTooActive,

    /// Upstream RPC failure, transport or method level. Safe to retry.
    #[error("Upstream RPC request failed")]
    Upstream(#[source] RpcError),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Stable error code carried in the envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameters(_) | ApiError::InvalidSlot(_) => "INVALID_PARAMETERS",
            ApiError::InvalidSignature(_) => "INVALID_SIGNATURE",
            ApiError::InvalidAddress(_) => "INVALID_ADDRESS",
            ApiError::UnknownNetwork(_) => "NOT_FOUND",
            ApiError::TransactionNotFound => "TRANSACTION_NOT_FOUND",
            ApiError::BlockNotFound => "BLOCK_NOT_FOUND",
            ApiError::SlotNotAvailable(_) => "SLOT_NOT_AVAILABLE",
            ApiError::TokenNotFound => "TOKEN_NOT_FOUND",
            ApiError::AnalyticsUnavailable => "ANALYTICS_DATA_UNAVAILABLE",
            ApiError::RateLimited => "RATE_LIMIT_EXCEEDED",
            ApiError::AddressTooActive => "ADDRESS_TOO_ACTIVE",
            ApiError::Upstream(_) => "RPC_ERROR",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status for this error kind. Pure: the same kind always maps to
    /// the same status.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::InvalidParameters(_)
            | ApiError::InvalidSignature(_)
            | ApiError::InvalidAddress(_)
            | ApiError::InvalidSlot(_) => 400,
            ApiError::UnknownNetwork(_)
            | ApiError::TransactionNotFound
            | ApiError::BlockNotFound
            | ApiError::SlotNotAvailable(_)
            | ApiError::TokenNotFound
            | ApiError::AnalyticsUnavailable => 404,
            ApiError::AddressTooActive => 413,
            ApiError::RateLimited => 429,
            ApiError::Upstream(_) => 503,
            ApiError::Internal(_) => 500,
        }
    }

    /// Structured detail payload for the envelope, when there is one.
    ///
    /// Upstream error text lands here and only here.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::InvalidParameters(issues) => serde_json::to_value(issues).ok(),
            ApiError::InvalidSignature(issue)
            | ApiError::InvalidAddress(issue)
            | ApiError::InvalidSlot(issue) => serde_json::to_value(std::slice::from_ref(issue)).ok(),
            ApiError::Upstream(source) => Some(serde_json::Value::String(source.to_string())),
            ApiError::Internal(detail) => Some(serde_json::Value::String(detail.clone())),
            _ => None,
        }
    }

    /// Builds the wire envelope for this error.
    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.code(), self.to_string(), self.details())
    }
}

/// Classifies an upstream RPC failure.
///
/// Rate limiting is recognized and re-classified as 429; everything else is
/// an upstream failure the caller may retry with backoff (503).
impl From<RpcError> for ApiError {
    fn from(err: RpcError) -> Self {
        if err.is_rate_limited() {
            ApiError::RateLimited
        } else {
            ApiError::Upstream(err)
        }
    }
}
