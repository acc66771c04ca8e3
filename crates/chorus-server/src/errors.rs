//! Error types for the hub and server.
//!
//! Hub membership operations never fail towards their caller; these types
//! cover the read-only queries, peer bookkeeping, and listener setup.

use thiserror::Error;

use crate::peer::PeerState;

/// Errors returned by hub queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    /// The hub control loop has stopped and its mailbox is closed.
    #[error("hub is not running")]
    Stopped,
    /// The control loop dropped the reply channel without answering.
    #[error("hub dropped the reply")]
    NoReply,
}

/// Why a frame could not be placed on a peer's outbound queue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The queue is at capacity; the peer is not draining.
    #[error("outbound queue full")]
    Full,
    /// The write loop has already exited.
    #[error("outbound queue closed")]
    Closed,
}

/// An illegal peer lifecycle transition.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid peer transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// State the peer was in.
    pub from: PeerState,
    /// State that was requested.
    pub to: PeerState,
}

/// Errors starting the HTTP listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listen address failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The bound socket could not report its address.
    #[error("failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
