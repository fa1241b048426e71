//! `GET /api/v1/{network}/tokens/{mint}`

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::tokens::normalize_token;
use solux_core::params::{path, TokenQuery};
use solux_core::rpc::RpcError;
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

pub async fn detail(
    State(gw): State<Arc<Gateway>>,
    Path((network, mint)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_address(&mint).map_err(ApiError::InvalidAddress)?;
    let query = TokenQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::Token,
        canonical_params(&[
            ("mint", mint.clone()),
            ("includeHolders", query.include_holders.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Rollup, fetch(&gw, &ctx, &mint, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Rollup, &data))
}

/// A mint that is not a token surfaces as an invalid-param method error
/// from `getTokenSupply`; report it as a missing token, not a 503.
fn classify_supply_error(err: RpcError) -> ApiError {
    match &err {
        RpcError::Method { code: -32602, .. } => ApiError::TokenNotFound,
        _ => err.into(),
    }
}

async fn fetch(
    gw: &Gateway,
    ctx: &RequestContext,
    mint: &str,
    query: &TokenQuery,
) -> Result<Value, ApiError> {
    let (supply, account) = tokio::join!(
        gw.call(ctx, "getTokenSupply", json!([mint])),
        gw.call(ctx, "getAccountInfo", json!([mint, {"encoding": "jsonParsed"}])),
    );
    let supply = supply.map_err(classify_supply_error)?;
    let account = account?;

    // Largest accounts are a best-effort enrichment.
    let holders = if query.include_holders {
        gw.call(ctx, "getTokenLargestAccounts", json!([mint])).await.ok()
    } else {
        None
    };

    let record = normalize_token(
        mint,
        &supply,
        &account,
        gw.token_metadata.metadata(mint),
        gw.token_metadata.price(mint),
        holders.as_ref(),
    )
    .ok_or(ApiError::TokenNotFound)?;
    to_value(record)
}
