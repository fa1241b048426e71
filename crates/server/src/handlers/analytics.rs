//! `GET /api/v1/{network}/analytics/overview`
//!
//! Served entirely through the configured analytics provider; the default
//! provider reports data as unavailable rather than fabricating rollups.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};

use solux_core::cache::{canonical_params, CacheKey, Endpoint, TtlClass};
use solux_core::error::ApiError;
use solux_core::params::AnalyticsOverviewQuery;
use solux_core::Gateway;

use super::{parse_network, respond, HandlerResult};

pub async fn overview(
    State(gw): State<Arc<Gateway>>,
    Path(network): Path<String>,
    Query(raw_query): Query<HashMap<String, String>>,
) -> HandlerResult {
    let network = parse_network(&network)?;
    let query = AnalyticsOverviewQuery::parse(&raw_query).map_err(ApiError::InvalidParameters)?;

    let _ctx = gw.context(network);
    let key = CacheKey::new(
        network,
        Endpoint::AnalyticsOverview,
        canonical_params(&[("timeframe", query.timeframe.as_str().to_string())]),
    );

    let data = gw
        .fetch_or_cache(key, TtlClass::Rollup, async {
            gw.analytics.overview(query.timeframe)
        })
        .await?;
    Ok(respond(&gw, TtlClass::Rollup, &data))
}
