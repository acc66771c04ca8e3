//! Cloneable handle used by the ingress and the peer loops to reach the hub.

use chorus_core::{Envelope, PeerId};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::command::HubCommand;
use crate::errors::HubError;
use crate::peer::Peer;

/// Sender side of the hub mailbox.
///
/// Remove and broadcast are fire-and-forget: they wait only for room in the
/// mailbox and never report failure. If the hub has stopped the request is
/// dropped. Admit waits for the control loop to apply it so the session knows
/// whether its loops may run.
#[derive(Clone, Debug)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(super) fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    /// Register a newly connected peer.
    ///
    /// Returns `false` if the id is already taken or the hub has stopped. In
    /// both cases the peer has been dropped and its queue is closed.
    pub async fn admit(&self, peer: Peer) -> bool {
        let (ack, admitted) = oneshot::channel();
        self.submit(HubCommand::Admit { peer, ack }).await;
        admitted.await.unwrap_or(false)
    }

    /// Deregister a peer. Safe to call more than once.
    pub async fn remove(&self, peer_id: PeerId) {
        self.submit(HubCommand::Remove(peer_id)).await;
    }

    /// Deliver `envelope` to every peer except `exclude`.
    pub async fn broadcast(&self, envelope: Envelope, exclude: Option<PeerId>) {
        self.submit(HubCommand::Broadcast { envelope, exclude }).await;
    }

    /// Identities currently in the peer set, as seen by the control loop.
    pub async fn peer_ids(&self) -> Result<Vec<PeerId>, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(HubCommand::PeerIds(reply_tx))
            .await
            .map_err(|_| HubError::Stopped)?;
        reply_rx.await.map_err(|_| HubError::NoReply)
    }

    /// Number of peers currently in the peer set.
    pub async fn peer_count(&self) -> Result<usize, HubError> {
        self.peer_ids().await.map(|ids| ids.len())
    }

    /// Whether the control loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn submit(&self, command: HubCommand) {
        if let Err(mpsc::error::SendError(command)) = self.tx.send(command).await {
            debug!(command = command.kind(), "hub stopped, dropping request");
        }
    }
}
