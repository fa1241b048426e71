//! Shared type definitions for the external response contract.
//!
//! Every endpoint wraps its payload in a [`SuccessEnvelope`] or
//! [`ErrorEnvelope`]; list endpoints attach a [`Pagination`] block. The
//! envelope shape is part of the public contract and must remain stable.

use serde::{Deserialize, Serialize};

/// Commitment level requested for upstream queries.
///
/// Ordering reflects increasing finality: `processed < confirmed < finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful response envelope: `{success: true, data, timestamp}`.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
}

impl<T: Serialize> SuccessEnvelope<T> {
    #[must_use]
    pub fn new(data: T) -> Self {
        Self { success: true, data, timestamp: now_rfc3339() }
    }
}

/// Error body carried inside [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Failed response envelope: `{success: false, error, timestamp}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(code: &str, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            error: ErrorBody { code: code.to_string(), message, details },
            timestamp: now_rfc3339(),
        }
    }
}

/// Pagination block attached to every list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    /// Builds a pagination block for a page `[offset, offset + limit)` of a
    /// collection with `total` items.
    #[must_use]
    pub fn page(total: usize, limit: usize, offset: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_next: offset + limit < total,
            has_previous: offset > 0,
        }
    }
}

/// Current UTC time as an RFC 3339 string, the envelope timestamp format.
#[must_use]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_roundtrip() {
        for (s, c) in [
            ("processed", Commitment::Processed),
            ("confirmed", Commitment::Confirmed),
            ("finalized", Commitment::Finalized),
        ] {
            assert_eq!(s.parse::<Commitment>(), Ok(c));
            assert_eq!(c.as_str(), s);
        }
        assert!("final".parse::<Commitment>().is_err());
    }

    #[test]
    fn commitment_ordering() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
    }

    #[test]
    fn success_envelope_shape() {
        let envelope = SuccessEnvelope::new(serde_json::json!({"slot": 5}));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["slot"], 5);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn error_envelope_omits_empty_details() {
        let envelope = ErrorEnvelope::new("BLOCK_NOT_FOUND", "Block not found".into(), None);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "BLOCK_NOT_FOUND");
        assert!(value["error"].get("details").is_none());
    }

    #[test]
    fn pagination_page_bounds() {
        let page = Pagination::page(10, 5, 0);
        assert!(page.has_next);
        assert!(!page.has_previous);

        let page = Pagination::page(10, 5, 5);
        assert!(!page.has_next);
        assert!(page.has_previous);

        let page = Pagination::page(0, 5, 0);
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }
}
