//! Typed failures for upstream JSON-RPC calls.

use thiserror::Error;

/// Solana RPC error code: block not available for slot.
const BLOCK_NOT_AVAILABLE: i64 = -32004;
/// Solana RPC error code: slot was skipped, or is missing in long-term storage.
const SLOT_SKIPPED: i64 = -32007;
/// Solana RPC error code: slot missing due to ledger jump.
const SLOT_SKIPPED_JUMP: i64 = -32009;

/// Errors produced by [`RpcClient`](super::RpcClient) calls.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RpcError {
    /// The upstream call exceeded the configured per-call timeout.
    #[error("upstream request timed out")]
    Timeout,

    /// All client permits are in use; the request was shed rather than queued.
    #[error("upstream concurrency limit reached")]
    Overloaded,

    /// Transport-level failure: non-2xx HTTP status from the upstream.
    #[error("upstream HTTP error {status}: {message}")]
    Transport { status: u16, message: String },

    /// Network-level failure before any HTTP status was received.
    #[error("upstream connection failed: {0}")]
    Connection(String),

    /// JSON-RPC error object returned by the upstream.
    #[error("upstream RPC error {code}: {message}")]
    Method { code: i64, message: String },

    /// Response body was not a valid JSON-RPC envelope.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// The JSON-RPC error code, when this is a method-level failure.
    #[must_use]
    pub fn method_code(&self) -> Option<i64> {
        match self {
            RpcError::Method { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the upstream reported that the requested slot has no block
    /// (skipped, pruned, or not yet produced).
    #[must_use]
    pub fn is_block_unavailable(&self) -> bool {
        matches!(
            self.method_code(),
            Some(BLOCK_NOT_AVAILABLE | SLOT_SKIPPED | SLOT_SKIPPED_JUMP)
        )
    }

    /// Whether the upstream signalled rate limiting.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RpcError::Transport { status: 429, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_unavailable_codes() {
        for code in [-32004, -32007, -32009] {
            let err = RpcError::Method { code, message: "slot skipped".into() };
            assert!(err.is_block_unavailable(), "code {code} should map to unavailable");
        }
        let err = RpcError::Method { code: -32602, message: "invalid params".into() };
        assert!(!err.is_block_unavailable());
        assert!(!RpcError::Timeout.is_block_unavailable());
    }

    #[test]
    fn rate_limit_detection() {
        assert!(RpcError::Transport { status: 429, message: "too many".into() }.is_rate_limited());
        assert!(!RpcError::Transport { status: 500, message: "boom".into() }.is_rate_limited());
        assert!(!RpcError::Timeout.is_rate_limited());
    }

    #[test]
    fn method_code_extraction() {
        let err = RpcError::Method { code: -32004, message: "x".into() };
        assert_eq!(err.method_code(), Some(-32004));
        assert_eq!(RpcError::Overloaded.method_code(), None);
    }
}
