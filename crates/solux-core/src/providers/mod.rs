//! Pluggable sources for data that does not come from the RPC node.
//!
//! Token names, logos, prices, and analytics rollups have no authoritative
//! in-process source. Rather than inlining fabricated values, each concern
//! sits behind a trait: the defaults answer only what they genuinely know
//! and return nothing (or "unavailable") for the rest.

use serde::Serialize;

use crate::error::ApiError;
use crate::params::Timeframe;

pub mod programs;

/// Off-chain token metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,
    pub verified: bool,
    pub tags: Vec<String>,
}

/// Market data for a token. Only produced by providers with a real source.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub usd: f64,
    pub change_24h: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_24h: Option<f64>,
    pub last_updated: String,
}

/// Source of token metadata and market data.
pub trait TokenMetadataProvider: Send + Sync {
    /// Metadata for a mint, when known.
    fn metadata(&self, mint: &str) -> Option<TokenMetadata>;

    /// Current market data for a mint, when a real price source exists.
    fn price(&self, mint: &str) -> Option<TokenPrice>;
}

/// Source of network analytics rollups.
pub trait AnalyticsProvider: Send + Sync {
    /// Aggregate overview for a timeframe.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AnalyticsUnavailable`] when no data source is
    /// configured.
    fn overview(&self, timeframe: Timeframe) -> Result<serde_json::Value, ApiError>;
}

/// Built-in registry of a few widely held, verified tokens.
///
/// Everything else resolves to `None`: unknown tokens are reported as
/// unknown, with no placeholder market data.
#[derive(Debug, Default)]
pub struct StaticTokenRegistry;

impl StaticTokenRegistry {
    const KNOWN: &'static [(&'static str, &'static str, &'static str, &'static str, &'static str)] = &[
        (
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "USD Coin",
            "USDC",
            "https://www.circle.com/usdc",
            "usd-coin",
        ),
        (
            "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
            "Tether USD",
            "USDT",
            "https://tether.to/",
            "tether",
        ),
        (
            "So11111111111111111111111111111111111111112",
            "Wrapped SOL",
            "SOL",
            "https://solana.com",
            "solana",
        ),
    ];
}

impl TokenMetadataProvider for StaticTokenRegistry {
    fn metadata(&self, mint: &str) -> Option<TokenMetadata> {
        Self::KNOWN.iter().find(|(known, ..)| *known == mint).map(
            |(_, name, symbol, website, coingecko_id)| TokenMetadata {
                name: (*name).to_string(),
                symbol: (*symbol).to_string(),
                logo_uri: None,
                website: Some((*website).to_string()),
                coingecko_id: Some((*coingecko_id).to_string()),
                verified: true,
                tags: Vec::new(),
            },
        )
    }

    fn price(&self, _mint: &str) -> Option<TokenPrice> {
        // The static registry has no market feed; a real provider plugs in here.
        None
    }
}

/// Default analytics provider: reports data as unavailable.
///
/// No analytics pipeline exists in-process; an operator with a real rollup
/// store implements [`AnalyticsProvider`] against it.
#[derive(Debug, Default)]
pub struct NullAnalyticsProvider;

impl AnalyticsProvider for NullAnalyticsProvider {
    fn overview(&self, _timeframe: Timeframe) -> Result<serde_json::Value, ApiError> {
        Err(ApiError::AnalyticsUnavailable)
    }
}
