//! # chorus-server
//!
//! The hub core and its WebSocket surface.
//!
//! - [`hub`]: the single actor that owns the peer set and serializes admit,
//!   remove and broadcast
//! - [`peer`]: per-connection outbound queue plus the read/write loops that
//!   bridge it to a transport
//! - [`ingress`]: Axum upgrade handler that turns a request into an admitted peer
//! - [`server`]: router, listener, `/health` and `/metrics`
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod hub;
pub mod ingress;
pub mod metrics;
pub mod peer;
pub mod server;
pub mod shutdown;
