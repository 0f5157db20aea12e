//! HTTP/WebSocket server for the tournament clock.
//!
//! Exposes the tournament manager over a REST API plus a WebSocket feed
//! per tournament. The binary in `main.rs` wires configuration, storage
//! and the router together; this library exists so integration tests can
//! build the router directly.

pub mod api;
pub mod config;
pub mod metrics;
