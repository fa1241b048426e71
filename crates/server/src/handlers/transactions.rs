//! `GET /api/v1/{network}/transactions/{signature}`

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::network::RequestContext;
use solux_core::normalize::transaction::{block_height_of, normalize_transaction};
use solux_core::params::{path, TransactionQuery};
use solux_core::Gateway;

use super::{parse_network, respond, to_value, HandlerResult};

pub async fn detail(
    State(gw): State<Arc<Gateway>>,
    Path((network, signature)): Path<(String, String)>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    path::check_signature(&signature).map_err(ApiError::InvalidSignature)?;
    let query = TransactionQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::Transaction,
        canonical_params(&[
            ("signature", signature.clone()),
            ("commitment", query.commitment.to_string()),
        ]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Standard, fetch(&gw, &ctx, &signature, &query))
        .await?;
    Ok(respond(&gw, TtlClass::Standard, &data))
}

async fn fetch(
    gw: &Gateway,
    ctx: &RequestContext,
    signature: &str,
    query: &TransactionQuery,
) -> Result<Value, ApiError> {
    let raw = gw
        .call(
            ctx,
            "getTransaction",
            json!([signature, {
                "encoding": "json",
                "commitment": query.commitment.as_str(),
                "maxSupportedTransactionVersion": query.max_supported_transaction_version,
            }]),
        )
        .await?;

    if raw.is_null() {
        return Err(ApiError::TransactionNotFound);
    }

    // Best-effort enrichment: resolve the slot's block height. Failure
    // leaves the field at 0 rather than failing the request.
    let slot = raw.get("slot").and_then(Value::as_u64).unwrap_or(0);
    let block_raw = if slot > 0 {
        gw.call(
            ctx,
            "getBlock",
            json!([slot, {"transactionDetails": "none", "rewards": false}]),
        )
        .await
        .ok()
    } else {
        None
    };

    let record = normalize_transaction(
        signature,
        &raw,
        query.commitment,
        block_height_of(block_raw.as_ref()),
    );
    to_value(record)
}
