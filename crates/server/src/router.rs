//! Route table and middleware stack.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use solux_core::Gateway;

use crate::handlers;
use crate::middleware;

/// Builds the application router.
///
/// The explorer is a public read-only service, so CORS permits all origins,
/// methods, and headers. Request IDs are set and propagated for log
/// correlation; body size and concurrency are capped from configuration.
pub fn create_router(gateway: Arc<Gateway>) -> Router {
    let (set_request_id, propagate_request_id) = middleware::create_request_id_layers();

    let max_concurrent = gateway.config.server.max_concurrent_requests;
    let body_limit = gateway.config.server.request_body_limit_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/v1/:network/network/stats", get(handlers::network::stats))
        .route("/api/v1/:network/search", get(handlers::search::search))
        .route("/api/v1/:network/transactions/:signature", get(handlers::transactions::detail))
        .route("/api/v1/:network/blocks/:slot", get(handlers::blocks::detail))
        .route("/api/v1/:network/blocks/:slot/transactions", get(handlers::blocks::transactions))
        .route("/api/v1/:network/addresses/:address", get(handlers::addresses::detail))
        .route(
            "/api/v1/:network/addresses/:address/transactions",
            get(handlers::addresses::transactions),
        )
        .route("/api/v1/:network/addresses/:address/tokens", get(handlers::addresses::tokens))
        .route("/api/v1/:network/addresses/:address/nfts", get(handlers::addresses::nfts))
        .route("/api/v1/:network/tokens/:mint", get(handlers::tokens::detail))
        .route("/api/v1/:network/analytics/overview", get(handlers::analytics::overview))
        .fallback(handlers::not_found)
        .with_state(gateway)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(ConcurrencyLimitLayer::new(max_concurrent))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(propagate_request_id)
        .layer(set_request_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use solux_core::config::AppConfig;
    use tower::ServiceExt;

    fn test_app() -> Router {
        let gateway = Arc::new(Gateway::new(AppConfig::default()).expect("gateway must build"));
        create_router(gateway)
    }

    async fn body_json(body: Body) -> Value {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        (parts.status, body_json(body).await)
    }

    #[tokio::test]
    async fn index_describes_service() {
        let (status, body) = get_json(test_app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["network"].as_str().unwrap().contains("{network}"));
    }

    #[tokio::test]
    async fn health_reports_cache_stats() {
        let (status, body) = get_json(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["cache"].get("entries").is_some());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_gets_envelope_404() {
        let (status, body) = get_json(test_app(), "/api/v2/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_network_rejected_before_upstream() {
        let (status, body) = get_json(test_app(), "/api/v1/testnet/network/stats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body["error"]["message"].as_str().unwrap().contains("testnet"));
    }

    #[tokio::test]
    async fn malformed_slot_rejected_fast() {
        let (status, body) = get_json(test_app(), "/api/v1/mainnet/blocks/notaslot").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PARAMETERS");
        assert_eq!(body["error"]["details"][0]["field"], "slot");
    }

    #[tokio::test]
    async fn malformed_address_rejected_fast() {
        let (status, body) = get_json(test_app(), "/api/v1/mainnet/addresses/tooshort").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_ADDRESS");
    }

    #[tokio::test]
    async fn malformed_signature_rejected_fast() {
        let (status, body) =
            get_json(test_app(), "/api/v1/mainnet/transactions/not-base58!").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_SIGNATURE");
    }

    #[tokio::test]
    async fn search_requires_query() {
        let (status, body) = get_json(test_app(), "/api/v1/mainnet/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PARAMETERS");
        assert_eq!(body["error"]["details"][0]["field"], "q");
    }

    #[tokio::test]
    async fn out_of_range_limit_rejected() {
        let (status, body) =
            get_json(test_app(), "/api/v1/mainnet/blocks/1/transactions?limit=5000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PARAMETERS");
    }

    #[tokio::test]
    async fn analytics_unavailable_with_default_provider() {
        let (status, body) = get_json(test_app(), "/api/v1/mainnet/analytics/overview").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "ANALYTICS_DATA_UNAVAILABLE");
    }

    #[tokio::test]
    async fn request_id_attached_to_responses() {
        let app = test_app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let app = test_app();
        let request = Request::builder()
            .uri("/health")
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let allow_origin = response.headers().get("access-control-allow-origin");
        assert_eq!(allow_origin.and_then(|v| v.to_str().ok()), Some("*"));
    }
}
