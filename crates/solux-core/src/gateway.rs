//! Shared gateway context wiring the RPC client, response cache, network
//! selection, and providers together.
//!
//! Handlers all follow the same pipeline: validate, cache-check, fetch with
//! fan-out, normalize, cache-store, envelope. [`Gateway::fetch_or_cache`]
//! implements the cache-check/fetch/store middle so each handler only
//! supplies its fetch future.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheKey, ResponseCache, TtlClass};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::network::{Network, NetworkState, RequestContext};
use crate::providers::{
    AnalyticsProvider, NullAnalyticsProvider, StaticTokenRegistry, TokenMetadataProvider,
};
use crate::rpc::{RpcClient, RpcError};

/// Process-wide gateway state, shared across all in-flight requests.
///
/// Cloning is not needed: the server holds one `Arc<Gateway>` and hands out
/// references.
pub struct Gateway {
    pub config: AppConfig,
    pub rpc: RpcClient,
    pub cache: ResponseCache,
    pub network_state: NetworkState,
    pub token_metadata: Arc<dyn TokenMetadataProvider>,
    pub analytics: Arc<dyn AnalyticsProvider>,
}

impl Gateway {
    /// Creates a gateway with the default providers (static token registry,
    /// analytics unavailable).
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] if the HTTP client fails to build.
    pub fn new(config: AppConfig) -> Result<Self, RpcError> {
        Self::with_providers(config, Arc::new(StaticTokenRegistry), Arc::new(NullAnalyticsProvider))
    }

    /// Creates a gateway with explicit provider implementations.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError`] if the HTTP client fails to build.
    pub fn with_providers(
        config: AppConfig,
        token_metadata: Arc<dyn TokenMetadataProvider>,
        analytics: Arc<dyn AnalyticsProvider>,
    ) -> Result<Self, RpcError> {
        let rpc = RpcClient::new(&config.rpc_client_config())?;
        Ok(Self {
            rpc,
            cache: ResponseCache::new(),
            network_state: NetworkState::default(),
            token_metadata,
            analytics,
            config,
        })
    }

    /// Builds the request-scoped context for a network and records the
    /// network against process state. A switch invalidates the whole cache
    /// so stale entries from the previous network can never be served.
    #[must_use]
    pub fn context(&self, network: Network) -> RequestContext {
        if self.network_state.observe(network) {
            tracing::info!(network = %network, "active network changed, invalidating cache");
            self.cache.clear();
        }
        RequestContext::new(network, self.config.rpc_url(network))
    }

    /// Issues one RPC call against the context's upstream.
    ///
    /// # Errors
    ///
    /// Propagates the [`RpcError`] unchanged; callers classify it.
    pub async fn call(
        &self,
        ctx: &RequestContext,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        self.rpc.call(&ctx.rpc_url, method, params).await
    }

    /// Cache-check / fetch / cache-store around a handler's fetch future.
    ///
    /// The future is constructed eagerly but only polled on a cache miss.
    /// A TTL of zero (class disabled or caching off) skips the store.
    ///
    /// # Errors
    ///
    /// Propagates the fetch future's [`ApiError`] on a miss.
    pub async fn fetch_or_cache<Fut>(
        &self,
        key: CacheKey,
        class: TtlClass,
        fetch: Fut,
    ) -> Result<Arc<Value>, ApiError>
    where
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(endpoint = key.endpoint.as_str(), "cache hit");
            return Ok(hit);
        }
        let value = fetch.await?;
        Ok(self.cache.insert(key, value, class.ttl(&self.config.cache)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Endpoint;

    fn gateway() -> Gateway {
        Gateway::new(AppConfig::default()).expect("default config must build")
    }

    #[test]
    fn context_carries_network_url() {
        let gw = gateway();
        let ctx = gw.context(Network::Mainnet);
        assert_eq!(ctx.network, Network::Mainnet);
        assert!(ctx.rpc_url.contains("mainnet"));

        let ctx = gw.context(Network::Devnet);
        assert!(ctx.rpc_url.contains("devnet"));
    }

    #[test]
    fn network_switch_invalidates_cache() {
        let gw = gateway();
        let _ = gw.context(Network::Mainnet);

        let key = CacheKey::new(Network::Mainnet, Endpoint::NetworkStats, String::new());
        gw.cache.insert(key.clone(), serde_json::json!({"slot": 1}), std::time::Duration::from_secs(60));
        assert!(gw.cache.get(&key).is_some());

        let _ = gw.context(Network::Devnet);
        assert!(gw.cache.get(&key).is_none(), "switch must clear previously cached entries");

        // Serving the same network again does not clear.
        let other = CacheKey::new(Network::Devnet, Endpoint::NetworkStats, String::new());
        gw.cache.insert(other.clone(), serde_json::json!(2), std::time::Duration::from_secs(60));
        let _ = gw.context(Network::Devnet);
        assert!(gw.cache.get(&other).is_some());
    }

    #[tokio::test]
    async fn fetch_or_cache_serves_hit_without_polling() {
        let gw = gateway();
        let key = CacheKey::new(Network::Mainnet, Endpoint::Block, "slot=1".to_string());
        gw.cache.insert(key.clone(), serde_json::json!("cached"), std::time::Duration::from_secs(60));

        // The fetch future would fail if polled; a hit must not reach it.
        let result = gw
            .fetch_or_cache(key, TtlClass::Finalized, async {
                Err(ApiError::Internal("must not be polled".into()))
            })
            .await
            .unwrap();
        assert_eq!(*result, serde_json::json!("cached"));
    }

    #[tokio::test]
    async fn fetch_or_cache_stores_on_miss() {
        let gw = gateway();
        let key = CacheKey::new(Network::Mainnet, Endpoint::Block, "slot=2".to_string());

        let result = gw
            .fetch_or_cache(key.clone(), TtlClass::Finalized, async {
                Ok(serde_json::json!({"slot": 2}))
            })
            .await
            .unwrap();
        assert_eq!(result["slot"], 2);
        assert!(gw.cache.get(&key).is_some(), "miss must populate the cache");
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let gw = gateway();
        let key = CacheKey::new(Network::Mainnet, Endpoint::Block, "slot=3".to_string());

        let result = gw
            .fetch_or_cache(key.clone(), TtlClass::Finalized, async { Err(ApiError::BlockNotFound) })
            .await;
        assert!(matches!(result, Err(ApiError::BlockNotFound)));
        assert!(gw.cache.get(&key).is_none(), "errors are never cached");
    }
}
