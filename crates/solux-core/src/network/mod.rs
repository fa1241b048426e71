//! Network selection: mainnet/devnet routing and switch detection.
//!
//! The network for a request is resolved from its route prefix into a
//! [`RequestContext`] that travels with the request; nothing downstream
//! reads hidden global state. A process-wide [`NetworkState`] additionally
//! tracks the most recently served network so the cache can be invalidated
//! wholesale when traffic switches networks.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Supported upstream networks. Exactly two in this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
}

impl Network {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Devnet => "devnet",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-scoped upstream binding: which network and which RPC URL.
///
/// Created once per inbound request and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub network: Network,
    pub rpc_url: Arc<str>,
}

impl RequestContext {
    #[must_use]
    pub fn new(network: Network, rpc_url: impl Into<Arc<str>>) -> Self {
        Self { network, rpc_url: rpc_url.into() }
    }
}

/// Process-wide record of the most recently served network.
///
/// [`observe`](NetworkState::observe) reports whether the network changed
/// since the previous request; the caller uses that signal to clear the
/// response cache and prevent cross-network data bleed.
#[derive(Debug)]
pub struct NetworkState {
    current: RwLock<Network>,
}

impl NetworkState {
    #[must_use]
    pub fn new(initial: Network) -> Self {
        Self { current: RwLock::new(initial) }
    }

    /// Current network, for diagnostics.
    #[must_use]
    pub fn current(&self) -> Network {
        *self.current.read()
    }

    /// Records that a request for `network` is being served. Returns `true`
    /// when this differs from the previously served network.
    pub fn observe(&self, network: Network) -> bool {
        {
            let current = self.current.read();
            if *current == network {
                return false;
            }
        }
        let mut current = self.current.write();
        // Double-check under the write lock: another request may have
        // already recorded the switch.
        if *current == network {
            return false;
        }
        *current = network;
        true
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        Self::new(Network::Mainnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_parse_roundtrip() {
        assert_eq!("mainnet".parse::<Network>(), Ok(Network::Mainnet));
        assert_eq!("devnet".parse::<Network>(), Ok(Network::Devnet));
        assert!("testnet".parse::<Network>().is_err());
        assert!("Mainnet".parse::<Network>().is_err());
    }

    #[test]
    fn observe_reports_switches_once() {
        let state = NetworkState::default();
        assert!(!state.observe(Network::Mainnet));
        assert!(state.observe(Network::Devnet));
        assert!(!state.observe(Network::Devnet));
        assert!(state.observe(Network::Mainnet));
        assert_eq!(state.current(), Network::Mainnet);
    }

    #[test]
    fn context_is_cheap_to_clone() {
        let ctx = RequestContext::new(Network::Devnet, "https://api.devnet.solana.com");
        let clone = ctx.clone();
        assert_eq!(clone.network, Network::Devnet);
        assert_eq!(&*clone.rpc_url, "https://api.devnet.solana.com");
    }
}
