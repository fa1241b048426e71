use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::RpcError;

/// Configuration for upstream call concurrency and timeouts.
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Maximum number of in-flight upstream requests.
    pub concurrent_limit: usize,
    /// Per-call timeout; expiry is classified as a 503 upstream failure.
    pub timeout: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self { concurrent_limit: 256, timeout: Duration::from_secs(15) }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 client over a pooled HTTP connection.
///
/// Concurrency is bounded by a semaphore; when no permit is available the
/// call is shed immediately as [`RpcError::Overloaded`] instead of queueing
/// behind a saturated upstream.
pub struct RpcClient {
    http: reqwest::Client,
    permits: Arc<Semaphore>,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::Connection`] if the underlying reqwest client
    /// fails to build.
    pub fn new(config: &RpcClientConfig) -> Result<Self, RpcError> {
        let http = reqwest::ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("solux/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                RpcError::Connection(format!("http client build failed: {e}"))
            })?;

        Ok(Self {
            http,
            permits: Arc::new(Semaphore::new(config.concurrent_limit)),
            timeout: config.timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Sanitizes network errors to avoid echoing connection details.
    fn sanitize_network_error(error: &reqwest::Error) -> String {
        if error.is_connect() {
            "connection refused or unreachable".to_string()
        } else if error.is_timeout() {
            "connection timed out".to_string()
        } else if error.is_body() || error.is_decode() {
            "response body error".to_string()
        } else if error.is_redirect() {
            "too many redirects".to_string()
        } else {
            "network error".to_string()
        }
    }

    /// Issues a single JSON-RPC 2.0 call and returns the `result` field.
    ///
    /// Callers never see the response envelope. Exactly one upstream request
    /// is made per invocation.
    ///
    /// # Errors
    ///
    /// - [`RpcError::Overloaded`] when no concurrency permit is available
    /// - [`RpcError::Timeout`] when the call exceeds the configured timeout
    /// - [`RpcError::Transport`] for non-2xx HTTP responses
    /// - [`RpcError::Connection`] for network-level failures
    /// - [`RpcError::Method`] when the upstream returns a JSON-RPC error
    /// - [`RpcError::InvalidResponse`] when the body is not a JSON-RPC envelope
    pub async fn call(
        &self,
        url: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let _permit = self.permits.try_acquire().map_err(|_| {
            tracing::warn!(method = method, "rpc concurrency limit reached");
            RpcError::Overloaded
        })?;

        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let started = std::time::Instant::now();
        let response = self
            .http
            .post(url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(method = method, "rpc request timed out");
                    RpcError::Timeout
                } else {
                    RpcError::Connection(Self::sanitize_network_error(&e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.len() > 256 {
                format!("{}... (truncated)", &text[..256])
            } else {
                text
            };
            tracing::debug!(method = method, status = status.as_u16(), "rpc http error");
            return Err(RpcError::Transport { status: status.as_u16(), message });
        }

        let envelope: RpcResponse = response.json().await.map_err(|e| {
            RpcError::InvalidResponse(format!("body decode failed: {}", Self::sanitize_network_error(&e)))
        })?;

        tracing::trace!(
            method = method,
            latency_ms = started.elapsed().as_millis() as u64,
            "rpc call complete"
        );

        if let Some(error) = envelope.error {
            return Err(RpcError::Method { code: error.code, message: error.message });
        }

        // JSON-RPC allows an explicit null result ("no such transaction");
        // surface it as Value::Null rather than a protocol violation.
        Ok(envelope.result.unwrap_or(serde_json::Value::Null))
    }

    #[cfg(test)]
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
