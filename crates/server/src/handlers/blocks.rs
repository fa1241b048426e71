//! `GET /api/v1/{network}/blocks/{slot}` and
//! `GET /api/v1/{network}/blocks/{slot}/transactions`

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::block::{build_transactions_page, normalize_block, Navigation};
use solux_core::params::{path, BlockQuery, BlockTransactionsQuery};
use solux_core::rpc::RpcError;
use solux_core::types::Commitment;
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

pub async fn detail(
    State(gw): State<Arc<Gateway>>,
    Path((network, slot)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    let slot = path::parse_slot(&slot).map_err(ApiError::InvalidSlot)?;
    let query = BlockQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::Block,
        canonical_params(&[
            ("slot", slot.to_string()),
            ("transactionDetails", query.transaction_details.as_str().to_string()),
            ("rewards", query.rewards.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Finalized, fetch_block(&gw, &ctx, slot, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Finalized, &data))
}

/// Maps upstream "no block at slot" signals onto the 404 taxonomy.
fn classify_block_error(err: RpcError, slot: u64) -> ApiError {
    if err.is_block_unavailable() {
        ApiError::SlotNotAvailable(slot)
    } else {
        err.into()
    }
}

/// Fetches a block with full transaction detail; the requested detail level
/// only shapes the response, while metrics always need per-transaction meta.
async fn fetch_raw_block(
    gw: &Gateway,
    ctx: &RequestContext,
    slot: u64,
    commitment: Commitment,
    rewards: bool,
) -> Result<Value, ApiError> {
    let raw = gw
        .call(
            ctx,
            "getBlock",
            json!([slot, {
                "encoding": "json",
                "commitment": commitment.as_str(),
                "transactionDetails": "full",
                "rewards": rewards,
                "maxSupportedTransactionVersion": 0,
            }]),
        )
        .await
        .map_err(|err| classify_block_error(err, slot))?;

    if raw.is_null() {
        return Err(ApiError::BlockNotFound);
    }
    Ok(raw)
}

/// Best-effort navigation: neighboring produced slots from `getBlocks`
/// range queries. Unresolvable neighbors are `null`.
async fn fetch_navigation(gw: &Gateway, ctx: &RequestContext, slot: u64) -> Navigation {
    let (prev, next) = tokio::join!(
        async {
            if slot == 0 {
                return None;
            }
            gw.call(ctx, "getBlocks", json!([slot.saturating_sub(10), slot - 1])).await.ok()
        },
        async { gw.call(ctx, "getBlocks", json!([slot + 1, slot + 10])).await.ok() },
    );

    Navigation {
        prev_slot: prev
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.last())
            .and_then(Value::as_u64),
        next_slot: next
            .as_ref()
            .and_then(Value::as_array)
            .and_then(|blocks| blocks.first())
            .and_then(Value::as_u64),
    }
}

async fn fetch_block(
    gw: &Gateway,
    ctx: &RequestContext,
    slot: u64,
    query: &BlockQuery,
) -> Result<Value, ApiError> {
    let raw = fetch_raw_block(gw, ctx, slot, query.commitment, query.rewards).await?;
    let navigation = fetch_navigation(gw, ctx, slot).await;

    let record =
        normalize_block(slot, &raw, query.transaction_details, query.rewards, navigation);
    to_value(record)
}

pub async fn transactions(
    State(gw): State<Arc<Gateway>>,
    Path((network, slot)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    let slot = path::parse_slot(&slot).map_err(ApiError::InvalidSlot)?;
    let query = BlockTransactionsQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::BlockTransactions,
        canonical_params(&[
            ("slot", slot.to_string()),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("status", query.status.as_str().to_string()),
            ("sortBy", query.sort_by.as_str().to_string()),
            ("sortOrder", query.sort_order.as_str().to_string()),
            ("includeDetails", query.include_details.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Finalized, fetch_page(&gw, &ctx, slot, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Finalized, &data))
}

async fn fetch_page(
    gw: &Gateway,
    ctx: &RequestContext,
    slot: u64,
    query: &BlockTransactionsQuery,
) -> Result<Value, ApiError> {
    let raw = fetch_raw_block(gw, ctx, slot, Commitment::Confirmed, false).await?;
    let page = build_transactions_page(slot, &raw, query);
    to_value(page)
}
