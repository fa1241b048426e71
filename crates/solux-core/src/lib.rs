//! # Solux Core
//!
//! Core library for the Solux block-explorer API gateway: a stateless
//! translator between a REST surface and Solana JSON-RPC.
//!
//! This crate provides the foundational components for:
//!
//! - **[`rpc`]**: JSON-RPC 2.0 client with per-call timeouts and bounded
//!   concurrency, surfacing upstream failures as typed errors.
//!
//! - **[`params`]**: declarative per-endpoint parsing of query and path
//!   parameters with coercion, defaulting, and bounds checks.
//!
//! - **[`normalize`]**: per-resource transforms from raw upstream JSON into
//!   the stable external contract (addresses, transactions, blocks, tokens,
//!   network stats, search).
//!
//! - **[`cache`]**: process-wide response cache with typed keys, per-entry
//!   expiry, and differentiated TTL classes per endpoint.
//!
//! - **[`error`]**: uniform success/error envelope and the error taxonomy
//!   mapped to HTTP status codes.
//!
//! - **[`network`]**: mainnet/devnet selection, request-scoped context, and
//!   the cache-invalidation trigger on network switch.
//!
//! - **[`providers`]**: pluggable token-metadata and analytics seams so
//!   externally sourced fields are never silently fabricated.
//!
//! ## Request Flow
//!
//! ```text
//! Client Request
//!       |
//!       v
//! +-------------+
//! |  Validation | --- invalid --> Error Envelope (400)
//! +------+------+
//!        | valid
//!        v
//! +-------------+
//! | Cache Check | --- hit --> Success Envelope
//! +------+------+
//!        | miss
//!        v
//! +-------------+     +-------------+     +-------------+
//! |  RPC Client | --> |  Normalizer | --> | Cache Store |
//! +-------------+     +-------------+     +------+------+
//!                                                |
//!                                                v
//!                                        Success Envelope
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod network;
pub mod normalize;
pub mod params;
pub mod providers;
pub mod rpc;
pub mod types;

pub use gateway::Gateway;
