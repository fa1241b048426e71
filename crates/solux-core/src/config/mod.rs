//! Application configuration with layered loading.
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `SOLUX_CONFIG` env var
//! 3. **Environment variables**: `SOLUX__*` vars override specific fields,
//!    with `__` as the nesting separator (e.g. `SOLUX__SERVER__BIND_PORT`)
//!
//! Configuration is validated at load time; invalid values return errors
//! rather than failing silently at request time.
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 8080
//!
//! [networks]
//! mainnet_url = "https://api.mainnet-beta.solana.com"
//! devnet_url = "https://api.devnet.solana.com"
//!
//! [cache]
//! volatile_ttl_seconds = 15
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::network::Network;
use crate::rpc::RpcClientConfig;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind. Defaults to `127.0.0.1`.
    pub bind_address: String,

    /// Port to listen on. Must be greater than 0. Defaults to `8080`.
    pub bind_port: u16,

    /// Maximum concurrent in-flight requests. Defaults to `256`.
    pub max_concurrent_requests: usize,

    /// Request body size cap in bytes. Defaults to `65536`.
    pub request_body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            max_concurrent_requests: 256,
            request_body_limit_bytes: 64 * 1024,
        }
    }
}

/// Upstream RPC endpoint per supported network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworksConfig {
    /// Mainnet JSON-RPC endpoint URL.
    pub mainnet_url: String,
    /// Devnet JSON-RPC endpoint URL.
    pub devnet_url: String,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            mainnet_url: "https://api.mainnet-beta.solana.com".to_string(),
            devnet_url: "https://api.devnet.solana.com".to_string(),
        }
    }
}

/// Upstream call behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Per-call timeout in seconds. Defaults to `15`.
    pub timeout_seconds: u64,
    /// Maximum concurrent upstream calls. Defaults to `256`.
    pub concurrent_limit: usize,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self { timeout_seconds: 15, concurrent_limit: 256 }
    }
}

/// Response-cache TTLs, one knob per volatility class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether response caching is enabled. Defaults to `true`.
    pub enabled: bool,

    /// Live network stats; changes every slot. Defaults to `15`.
    pub volatile_ttl_seconds: u64,

    /// Transaction detail and search results. Defaults to `30`.
    pub standard_ttl_seconds: u64,

    /// Token and address balances. Defaults to `60`.
    pub balances_ttl_seconds: u64,

    /// Finalized blocks and their transaction pages. Defaults to `300`.
    pub finalized_ttl_seconds: u64,

    /// Aggregate rollups. Defaults to `600`.
    pub rollup_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volatile_ttl_seconds: 15,
            standard_ttl_seconds: 30,
            balances_ttl_seconds: 60,
            finalized_ttl_seconds: 300,
            rollup_ttl_seconds: 600,
        }
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g. "trace", "debug", "info"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub networks: NetworksConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// The file is optional; absent files fall back to compiled defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be parsed, or
    /// an override has the wrong shape.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("SOLUX").separator("__"))
            .build()?;

        // Missing sections deserialize through the serde defaults.
        builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml`, overridable via the
    /// `SOLUX_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("SOLUX_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(path)
    }

    /// Validates the configuration for correctness.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string when a value is out of range or an
    /// endpoint URL is malformed.
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in
            [("mainnet", &self.networks.mainnet_url), ("devnet", &self.networks.devnet_url)]
        {
            if url.is_empty() {
                return Err(format!("Empty RPC URL for network: {name}"));
            }
            if !url.starts_with("http") {
                return Err(format!("Invalid RPC URL for network {name}: {url}"));
            }
        }

        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }
        if self.server.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }
        if self.rpc.timeout_seconds == 0 {
            return Err("RPC timeout must be greater than 0".to_string());
        }
        if self.rpc.concurrent_limit == 0 {
            return Err("RPC concurrency limit must be greater than 0".to_string());
        }
        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }

    /// Upstream RPC URL for a network.
    #[must_use]
    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::Mainnet => &self.networks.mainnet_url,
            Network::Devnet => &self.networks.devnet_url,
        }
    }

    /// RPC client settings derived from this configuration.
    #[must_use]
    pub fn rpc_client_config(&self) -> RpcClientConfig {
        RpcClientConfig {
            concurrent_limit: self.rpc.concurrent_limit,
            timeout: Duration::from_secs(self.rpc.timeout_seconds),
        }
    }

    /// Parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address does not parse.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port).parse().map_err(|_| {
            format!("Invalid socket address: {}:{}", self.server.bind_address, self.server.bind_port)
        })
    }
}
