//! One connected stream: its outbound queue and the loops that drive it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `state` | `connecting → active → closing → closed` lifecycle |
//! | `reader` | transport → hub broadcast |
//! | `writer` | outbound queue → transport |
//! | `session` | admits the peer, runs both loops, tracks the lifecycle |
//!
//! A [`Peer`] is the hub-side half: the identity plus the only sender of the
//! outbound queue. Dropping it closes the queue, which is the sole removal
//! signal the write loop understands. The [`OutboundQueue`] is the
//! receiving half, owned by the write loop.

pub mod reader;
pub mod session;
pub mod state;
pub mod writer;

pub use reader::read_loop;
pub use session::run_session;
pub use state::PeerState;
pub use writer::write_loop;

use std::sync::Arc;

use chorus_core::PeerId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::errors::DeliveryError;

/// Why a peer loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The hub closed the outbound queue.
    QueueClosed,
    /// The remote side closed the stream (close frame or end of stream).
    PeerClosed,
    /// A transport read or write failed.
    TransportError,
}

/// Hub-side handle to one connected peer.
#[derive(Debug)]
pub struct Peer {
    id: PeerId,
    outbound: mpsc::Sender<Arc<str>>,
}

impl Peer {
    /// Allocate the outbound queue for `id`.
    ///
    /// `capacity` is clamped to at least one slot.
    pub fn new(id: PeerId, capacity: usize) -> (Self, OutboundQueue) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id, outbound: tx }, OutboundQueue { rx })
    }

    /// This peer's identity.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Non-blocking enqueue of one encoded frame.
    pub fn try_deliver(&self, frame: &Arc<str>) -> Result<(), DeliveryError> {
        self.outbound
            .try_send(Arc::clone(frame))
            .map_err(|e| match e {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }
}

/// Receiving half of a peer's outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    rx: mpsc::Receiver<Arc<str>>,
}

impl OutboundQueue {
    /// Next queued frame, or `None` once the hub has closed the queue and
    /// every buffered frame has been taken.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Take a queued frame without waiting.
    pub fn try_recv(&mut self) -> Result<Arc<str>, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drain whatever is queued right now.
    pub fn drain_ready(&mut self) -> Vec<Arc<str>> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Whether the hub side has been dropped and no frames remain.
    pub fn is_closed(&mut self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}
