//! Address endpoints: detail, transaction history, token holdings, NFTs.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde_json::{json, Map, Value};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::address::normalize_address;
use solux_core::normalize::history::build_history_page;
use solux_core::normalize::tokens::{build_holdings_page, build_nfts_page};
use solux_core::params::{
    path, AddressNftsQuery, AddressQuery, AddressTokensQuery, AddressTransactionsQuery,
};
use solux_core::providers::programs::SPL_TOKEN_PROGRAM;
use solux_core::rpc::RpcError;
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

/// Signature window enriched with full transaction detail per page.
const DETAIL_LIMIT: usize = 10;

pub async fn detail(
    State(gw): State<Arc<Gateway>>,
    Path((network, address)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_address(&address).map_err(ApiError::InvalidAddress)?;
    let query = AddressQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::Address,
        canonical_params(&[
            ("address", address.clone()),
            ("includeTokens", query.include_tokens.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Balances, fetch_detail(&gw, &ctx, &address, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Balances, &data))
}

async fn fetch_detail(
    gw: &Gateway,
    ctx: &RequestContext,
    address: &str,
    query: &AddressQuery,
) -> Result<Value, ApiError> {
    // Primary facts: balance and account info, fetched concurrently. Both
    // must resolve for the request to succeed.
    let (balance, account) = tokio::join!(
        gw.call(ctx, "getBalance", json!([address])),
        gw.call(
            ctx,
            "getAccountInfo",
            json!([address, {"encoding": "jsonParsed", "commitment": query.commitment.as_str()}]),
        ),
    );
    let balance = balance?;
    let account = account?;

    // Secondary facts degrade to defaults rather than failing the request.
    let (token_accounts, signatures) = tokio::join!(
        async {
            if !query.include_tokens {
                return None;
            }
            gw.call(
                ctx,
                "getTokenAccountsByOwner",
                json!([address, {"programId": SPL_TOKEN_PROGRAM}, {"encoding": "jsonParsed"}]),
            )
            .await
            .ok()
        },
        async {
            gw.call(ctx, "getSignaturesForAddress", json!([address, {"limit": 100}])).await.ok()
        },
    );

    let record = normalize_address(
        address,
        &balance,
        &account,
        token_accounts.as_ref(),
        signatures.as_ref(),
        query.include_tokens,
    );
    to_value(record)
}

pub async fn transactions(
    State(gw): State<Arc<Gateway>>,
    Path((network, address)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_address(&address).map_err(ApiError::InvalidAddress)?;
    let query = AddressTransactionsQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::AddressTransactions,
        canonical_params(&[
            ("address", address.clone()),
            ("limit", query.limit.to_string()),
            ("before", query.before.clone().unwrap_or_default()),
            ("until", query.until.clone().unwrap_or_default()),
            ("filter", query.filter.as_str().to_string()),
            ("program", query.program.clone().unwrap_or_default()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Standard, fetch_history(&gw, &ctx, &address, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Standard, &data))
}

/// An address with more history than the node will enumerate surfaces as a
/// method error; re-classify it as the 413 request-too-expensive kind.
fn classify_history_error(err: RpcError) -> ApiError {
    match &err {
        RpcError::Method { message, .. } if message.to_lowercase().contains("too many") => {
            ApiError::AddressTooActive
        }
        _ => err.into(),
    }
}

async fn fetch_history(
    gw: &Gateway,
    ctx: &RequestContext,
    address: &str,
    query: &AddressTransactionsQuery,
) -> Result<Value, ApiError> {
    let mut options = Map::new();
    options.insert("limit".to_string(), json!(query.limit));
    options.insert("commitment".to_string(), json!(query.commitment.as_str()));
    if let Some(before) = &query.before {
        options.insert("before".to_string(), json!(before));
    }
    if let Some(until) = &query.until {
        options.insert("until".to_string(), json!(until));
    }

    let signatures_raw = gw
        .call(ctx, "getSignaturesForAddress", json!([address, options]))
        .await
        .map_err(classify_history_error)?;
    let signatures: Vec<Value> =
        signatures_raw.as_array().cloned().unwrap_or_default();

    // Enrich only the head of the window with full transactions, fetched
    // concurrently; each lookup is best-effort.
    let detail_futures = signatures.iter().take(DETAIL_LIMIT).map(|sig_info| {
        let signature = sig_info.get("signature").and_then(Value::as_str).unwrap_or_default();
        async move {
            if signature.is_empty() {
                return None;
            }
            gw.call(
                ctx,
                "getTransaction",
                json!([signature, {
                    "encoding": "jsonParsed",
                    "commitment": query.commitment.as_str(),
                    "maxSupportedTransactionVersion": 0,
                }]),
            )
            .await
            .ok()
        }
    });
    let details: Vec<Option<Value>> = futures::future::join_all(detail_futures).await;

    let page = build_history_page(address, &signatures, &details, query);
    to_value(page)
}

pub async fn tokens(
    State(gw): State<Arc<Gateway>>,
    Path((network, address)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_address(&address).map_err(ApiError::InvalidAddress)?;
    let query = AddressTokensQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::AddressTokens,
        canonical_params(&[
            ("address", address.clone()),
            ("includeNFTs", query.include_nfts.to_string()),
            ("includeZeroBalance", query.include_zero_balance.to_string()),
            ("includePrices", query.include_prices.to_string()),
            ("sortBy", query.sort_by.as_str().to_string()),
            ("sortOrder", query.sort_order.as_str().to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Balances, fetch_tokens(&gw, &ctx, &address, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Balances, &data))
}

async fn fetch_tokens(
    gw: &Gateway,
    ctx: &RequestContext,
    address: &str,
    query: &AddressTokensQuery,
) -> Result<Value, ApiError> {
    let raw = gw
        .call(
            ctx,
            "getTokenAccountsByOwner",
            json!([address, {"programId": SPL_TOKEN_PROGRAM}, {"encoding": "jsonParsed"}]),
        )
        .await?;

    let page = build_holdings_page(address, &raw, gw.token_metadata.as_ref(), query);
    to_value(page)
}

pub async fn nfts(
    State(gw): State<Arc<Gateway>>,
    Path((network, address)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_address(&address).map_err(ApiError::InvalidAddress)?;
    let query = AddressNftsQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::AddressNfts,
        canonical_params(&[
            ("address", address.clone()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Finalized, fetch_nfts(&gw, &ctx, &address, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Finalized, &data))
}

async fn fetch_nfts(
    gw: &Gateway,
    ctx: &RequestContext,
    address: &str,
    query: &AddressNftsQuery,
) -> Result<Value, ApiError> {
    let raw = gw
        .call(
            ctx,
            "getTokenAccountsByOwner",
            json!([address, {"programId": SPL_TOKEN_PROGRAM}, {"encoding": "jsonParsed"}]),
        )
        .await?;

    let page = build_nfts_page(address, &raw, query.limit, query.offset);
    to_value(page)
}
