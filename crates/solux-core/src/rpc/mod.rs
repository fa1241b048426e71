//! JSON-RPC 2.0 client for the upstream Solana node.
//!
//! One logical invocation maps to exactly one upstream POST: no retries and
//! no circuit breaking. Callers needing several facts fan out concurrent
//! calls themselves and tolerate partial failure with safe defaults.

mod client;
mod errors;

pub use client::{RpcClient, RpcClientConfig};
pub use errors::RpcError;
