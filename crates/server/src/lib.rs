//! HTTP server for the Solux explorer API gateway.
//!
//! The binary in `main.rs` wires configuration, logging, and graceful
//! shutdown around [`router::create_router`].

pub mod handlers;
pub mod middleware;
pub mod router;
