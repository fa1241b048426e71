//! HTTP handlers.
//!
//! Every resource handler follows the same pipeline: parse the network
//! prefix, validate parameters, then hand a fetch future to
//! [`Gateway::fetch_or_cache`] and wrap the result in the success envelope
//! with the endpoint's `Cache-Control` class. All failures funnel through
//! [`ApiFailure`] so no handler can leak a non-envelope error body.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use solux_core::cache::TtlClass;
use solux_core::error::ApiError;
use solux_core::network::Network;
use solux_core::types::{now_rfc3339, SuccessEnvelope};
use solux_core::Gateway;

pub mod addresses;
pub mod analytics;
pub mod blocks;
pub mod network;
pub mod search;
pub mod tokens;
pub mod transactions;

/// Wrapper giving [`ApiError`] an HTTP rendering.
#[derive(Debug)]
pub struct ApiFailure(pub ApiError);

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::warn!(code = self.0.code(), error = %self.0, "request failed");
        } else {
            tracing::debug!(code = self.0.code(), "request rejected");
        }
        (status, Json(self.0.envelope())).into_response()
    }
}

pub type HandlerResult = Result<Response, ApiFailure>;

/// Parses the `{network}` route segment.
pub fn parse_network(raw: &str) -> Result<Network, ApiError> {
    raw.parse::<Network>().map_err(|()| ApiError::UnknownNetwork(raw.to_string()))
}

/// Serializes a normalized record for caching.
pub fn to_value<T: serde::Serialize>(record: T) -> Result<Value, ApiError> {
    serde_json::to_value(record).map_err(|e| ApiError::Internal(format!("serialization failed: {e}")))
}

/// Success envelope plus the TTL class's `Cache-Control` header.
pub fn respond(gw: &Gateway, class: TtlClass, data: &Arc<Value>) -> Response {
    let envelope = SuccessEnvelope::new(Value::clone(data));
    (
        [(header::CACHE_CONTROL, class.cache_control(&gw.config.cache))],
        Json(envelope),
    )
        .into_response()
}

/// `GET /` service index.
pub async fn index() -> Response {
    Json(json!({
        "message": "Welcome to Solux API",
        "version": env!("CARGO_PKG_VERSION"),
        "networks": ["mainnet", "devnet"],
        "endpoints": {
            "network": "/api/v1/{network}/network/stats",
            "search": "/api/v1/{network}/search?q={query}&type={auto|transaction|block|address}",
            "transaction": "/api/v1/{network}/transactions/{signature}",
            "block": "/api/v1/{network}/blocks/{slot}",
            "blockTransactions": "/api/v1/{network}/blocks/{slot}/transactions",
            "address": "/api/v1/{network}/addresses/{address}",
            "addressTransactions": "/api/v1/{network}/addresses/{address}/transactions",
            "addressTokens": "/api/v1/{network}/addresses/{address}/tokens",
            "addressNfts": "/api/v1/{network}/addresses/{address}/nfts",
            "token": "/api/v1/{network}/tokens/{mint}",
            "analyticsOverview": "/api/v1/{network}/analytics/overview",
        },
    }))
    .into_response()
}

/// `GET /health` liveness endpoint.
pub async fn health(State(gw): State<Arc<Gateway>>) -> Response {
    Json(json!({
        "status": "ok",
        "network": gw.network_state.current(),
        "cache": gw.cache.stats(),
        "timestamp": now_rfc3339(),
    }))
    .into_response()
}

/// Fallback for unmatched routes: same envelope shape as every other error.
pub async fn not_found() -> Response {
    let envelope = solux_core::types::ErrorEnvelope::new(
        "NOT_FOUND",
        "Endpoint not found".to_string(),
        Some(Value::String("The requested endpoint does not exist".to_string())),
    );
    (StatusCode::NOT_FOUND, Json(envelope)).into_response()
}
