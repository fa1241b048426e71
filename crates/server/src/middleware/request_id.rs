//! Request ID middleware.
//!
//! Extracts or generates an `x-request-id` for each request and copies it
//! to the response, so a failing request can be correlated with its log
//! lines.

use axum::http::{header::HeaderValue, HeaderName, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// The header name for request correlation IDs.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// A UUID v4 generator for request IDs.
#[derive(Clone, Copy, Default)]
pub struct UuidRequestIdGenerator;

impl MakeRequestId for UuidRequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).ok()?))
    }
}

/// Creates the request ID layer stack.
///
/// Returns `(set, propagate)`; apply `propagate` first so it runs after
/// `set` (axum applies layers bottom-up).
pub fn create_request_id_layers() -> (
    tower_http::request_id::SetRequestIdLayer<UuidRequestIdGenerator>,
    tower_http::request_id::PropagateRequestIdLayer,
) {
    use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

    let set_layer = SetRequestIdLayer::new(X_REQUEST_ID.clone(), UuidRequestIdGenerator);
    let propagate_layer = PropagateRequestIdLayer::new(X_REQUEST_ID.clone());

    (set_layer, propagate_layer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn simple_handler() -> &'static str {
        "ok"
    }

    fn create_test_app() -> Router {
        let (set_layer, propagate_layer) = create_request_id_layers();
        Router::new().route("/test", get(simple_handler)).layer(propagate_layer).layer(set_layer)
    }

    #[tokio::test]
    async fn generates_request_id_when_missing() {
        let app = create_test_app();
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let header = response.headers().get(&X_REQUEST_ID).expect("should have request ID");
        let id = header.to_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok(), "generated ID should be a UUID, got: {id}");
    }

    #[tokio::test]
    async fn preserves_existing_request_id() {
        let app = create_test_app();
        let custom_id = "my-custom-request-id-123";

        let request = Request::builder()
            .uri("/test")
            .header(X_REQUEST_ID.clone(), custom_id)
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let header = response.headers().get(&X_REQUEST_ID).expect("should have request ID");
        assert_eq!(header.to_str().unwrap(), custom_id);
    }
}
