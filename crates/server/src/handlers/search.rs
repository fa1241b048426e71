//! `GET /api/v1/{network}/search`

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::search::{
    address_summary, block_summary, detect_query_type, transaction_summary, SearchResponse,
};
use solux_core::normalize::unwrap_context;
use solux_core::params::{ParamIssue, SearchQuery, SearchType};
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

pub async fn search(
    State(gw): State<Arc<Gateway>>,
    Path(network): Path<String>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    let query = SearchQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::Search,
        canonical_params(&[
            ("q", query.q.clone()),
            ("type", query.search_type.as_str().to_string()),
        ]),
    );

    let data = gw.fetch_or_cache(key, TtlClass::Standard, fetch(&gw, &ctx, &query)).await?;
    Ok(respond(&gw, TtlClass::Standard, &data))
}

/// Dispatches on the (detected) query type. In auto mode lookup failures
/// yield the empty result set with suggestions; an explicitly requested
/// type propagates its classified error instead.
async fn fetch(gw: &Gateway, ctx: &RequestContext, query: &SearchQuery) -> Result<Value, ApiError> {
    let explicit = query.search_type != SearchType::Auto;
    let detected =
        if explicit { query.search_type } else { detect_query_type(&query.q) };

    let response = match detected {
        SearchType::Transaction => lookup_transaction(gw, ctx, &query.q, explicit).await?,
        SearchType::Block => lookup_block(gw, ctx, &query.q, explicit).await?,
        SearchType::Address | SearchType::Auto => {
            lookup_address(gw, ctx, &query.q, explicit).await?
        }
    };
    to_value(response)
}

async fn lookup_transaction(
    gw: &Gateway,
    ctx: &RequestContext,
    q: &str,
    explicit: bool,
) -> Result<SearchResponse, ApiError> {
    let result = gw
        .call(
            ctx,
            "getTransaction",
            json!([q, {"encoding": "json", "maxSupportedTransactionVersion": 0}]),
        )
        .await;

    match result {
        Ok(raw) if !raw.is_null() => Ok(SearchResponse::hit(q, transaction_summary(q, &raw))),
        Ok(_) if explicit => Err(ApiError::TransactionNotFound),
        Ok(_) => Ok(SearchResponse::empty(q)),
        Err(err) if explicit => Err(err.into()),
        Err(_) => Ok(SearchResponse::empty(q)),
    }
}

async fn lookup_block(
    gw: &Gateway,
    ctx: &RequestContext,
    q: &str,
    explicit: bool,
) -> Result<SearchResponse, ApiError> {
    let Ok(slot) = q.parse::<u64>() else {
        if explicit {
            return Err(ApiError::InvalidParameters(vec![ParamIssue::new(
                "q",
                "must be a slot number for block search",
            )]));
        }
        return Ok(SearchResponse::empty(q));
    };

    let result = gw
        .call(
            ctx,
            "getBlock",
            json!([slot, {
                "transactionDetails": "signatures",
                "rewards": false,
                "maxSupportedTransactionVersion": 0,
            }]),
        )
        .await;

    match result {
        Ok(raw) if !raw.is_null() => Ok(SearchResponse::hit(q, block_summary(slot, &raw))),
        Ok(_) if explicit => Err(ApiError::BlockNotFound),
        Ok(_) => Ok(SearchResponse::empty(q)),
        Err(err) if explicit && err.is_block_unavailable() => Err(ApiError::SlotNotAvailable(slot)),
        Err(err) if explicit => Err(err.into()),
        Err(_) => Ok(SearchResponse::empty(q)),
    }
}

async fn lookup_address(
    gw: &Gateway,
    ctx: &RequestContext,
    q: &str,
    explicit: bool,
) -> Result<SearchResponse, ApiError> {
    let result =
        gw.call(ctx, "getAccountInfo", json!([q, {"encoding": "base64"}])).await;

    match result {
        Ok(raw) if !unwrap_context(&raw).is_null() => {
            Ok(SearchResponse::hit(q, address_summary(q, &raw)))
        }
        Ok(_) => Ok(SearchResponse::empty(q)),
        Err(err) if explicit => Err(err.into()),
        Err(_) => Ok(SearchResponse::empty(q)),
    }
}
