//! Process-wide response cache with typed keys and per-entry expiry.
//!
//! Entries are immutable once written and merely expire; lookup evicts
//! lazily. Keys are a typed triple of network, logical endpoint, and a
//! canonical parameter serialization, so two endpoints can never collide on
//! an ad hoc string prefix and entries can never leak across networks.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::network::Network;

/// Logical endpoint identity, one variant per cacheable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    NetworkStats,
    Search,
    Transaction,
    Block,
    BlockTransactions,
    Address,
    AddressTransactions,
    AddressTokens,
    AddressNfts,
    Token,
    AnalyticsOverview,
}

impl Endpoint {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Endpoint::NetworkStats => "network_stats",
            Endpoint::Search => "search",
            Endpoint::Transaction => "transaction",
            Endpoint::Block => "block",
            Endpoint::BlockTransactions => "block_transactions",
            Endpoint::Address => "address",
            Endpoint::AddressTransactions => "address_transactions",
            Endpoint::AddressTokens => "address_tokens",
            Endpoint::AddressNfts => "address_nfts",
            Endpoint::Token => "token",
            Endpoint::AnalyticsOverview => "analytics_overview",
        }
    }
}

/// TTL class per data volatility. Values come from [`CacheConfig`]; the
/// classes fix the relative policy: live network data expires fastest,
/// finalized and rollup data slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    /// Network-wide live stats; changes every slot.
    Volatile,
    /// Observed transaction detail and search results.
    Standard,
    /// Token and address balances.
    Balances,
    /// Finalized blocks and their transaction pages; immutable once confirmed.
    Finalized,
    /// Aggregate rollups; expensive to recompute, tolerant of staleness.
    Rollup,
}

impl TtlClass {
    /// Entry lifetime for this class.
    #[must_use]
    pub fn ttl(self, config: &CacheConfig) -> Duration {
        if !config.enabled {
            return Duration::ZERO;
        }
        let seconds = match self {
            TtlClass::Volatile => config.volatile_ttl_seconds,
            TtlClass::Standard => config.standard_ttl_seconds,
            TtlClass::Balances => config.balances_ttl_seconds,
            TtlClass::Finalized => config.finalized_ttl_seconds,
            TtlClass::Rollup => config.rollup_ttl_seconds,
        };
        Duration::from_secs(seconds)
    }

    /// `Cache-Control` header value advertising this class to HTTP caches.
    #[must_use]
    pub fn cache_control(self, config: &CacheConfig) -> String {
        let max_age = self.ttl(config).as_secs();
        if max_age == 0 {
            return "no-store".to_string();
        }
        format!("public, max-age={max_age}, stale-while-revalidate={}", max_age * 2)
    }
}

/// Typed cache key: network + endpoint + canonical parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub network: Network,
    pub endpoint: Endpoint,
    pub params: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(network: Network, endpoint: Endpoint, params: String) -> Self {
        Self { network, endpoint, params }
    }
}

/// Canonical, order-independent serialization of resolved parameters.
///
/// Pairs are sorted by key so equivalent parameter sets produce identical
/// keys regardless of declaration order.
#[must_use]
pub fn canonical_params(pairs: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = pairs.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);
    let mut out = String::new();
    for (key, value) in sorted {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}

struct CacheEntry {
    value: Arc<serde_json::Value>,
    inserted_at: Instant,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }
}

/// Aggregate counters for diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// The process-wide response cache.
///
/// Thread-safe; entries are immutable once written, so concurrent access
/// needs no coordination beyond the map's own sharding.
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: DashMap::new(), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    /// Looks up a key, lazily evicting it when expired.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Arc<serde_json::Value>> {
        let now = Instant::now();
        // The read guard is confined to the closure; eviction below takes
        // the shard's write lock and must not overlap with it.
        let hit = self
            .entries
            .get(key)
            .and_then(|entry| (!entry.is_expired(now)).then(|| Arc::clone(&entry.value)));

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Stores a value under `key` for `ttl`.
    ///
    /// A zero `ttl` disables caching for this call: nothing is stored, the
    /// value is only wrapped and returned.
    pub fn insert(&self, key: CacheKey, value: serde_json::Value, ttl: Duration) -> Arc<serde_json::Value> {
        let value = Arc::new(value);
        if ttl.is_zero() {
            return value;
        }
        let now = Instant::now();
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                inserted_at: now,
                expires_at: Some(now + ttl),
            },
        );
        value
    }

    /// Stores a value that never expires.
    pub fn insert_permanent(&self, key: CacheKey, value: serde_json::Value) -> Arc<serde_json::Value> {
        let value = Arc::new(value);
        self.entries.insert(
            key,
            CacheEntry { value: Arc::clone(&value), inserted_at: Instant::now(), expires_at: None },
        );
        value
    }

    /// Removes a single entry.
    pub fn remove(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    /// Drops every entry. Called when the active network switches.
    pub fn clear(&self) {
        tracing::info!(entries = self.entries.len(), "clearing response cache");
        self.entries.clear();
    }

    /// Sweeps expired entries eagerly. Lookup already evicts lazily; this
    /// keeps memory bounded for keys that are never read again.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Age of the entry under `key`, if present.
    #[must_use]
    pub fn entry_age(&self, key: &CacheKey) -> Option<Duration> {
        self.entries.get(key).map(|entry| entry.inserted_at.elapsed())
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
