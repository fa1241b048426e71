//! `GET /api/v1/{network}/network/stats`

use std::sync::Arc;

use axum::extract::{Path, State};
use serde_json::{json, Value};

use solux_core::cache::{CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::network::normalize_network_stats;
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

pub async fn stats(
    State(gw): State<Arc<Gateway>>,
    Path(network): Path<String>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    let ctx = gw.context(network);
    let key = CacheKey::new(network, Endpoint::NetworkStats, String::new());

    let data = gw.fetch_or_cache(key, TtlClass::Volatile, fetch(&gw, &ctx)).await?;
    Ok(respond(&gw, TtlClass::Volatile, &data))
}

/// Fans out the five stats lookups concurrently; all are required.
async fn fetch(gw: &Gateway, ctx: &RequestContext) -> Result<Value, ApiError> {
    let (slot, epoch, supply, performance, votes) = tokio::join!(
        gw.call(ctx, "getSlot", json!([])),
        gw.call(ctx, "getEpochInfo", json!([])),
        gw.call(ctx, "getSupply", json!([])),
        gw.call(ctx, "getRecentPerformanceSamples", json!([1])),
        gw.call(ctx, "getVoteAccounts", json!([])),
    );

    let stats = normalize_network_stats(&slot?, &epoch?, &supply?, &performance?, &votes?);
    to_value(stats)
}
