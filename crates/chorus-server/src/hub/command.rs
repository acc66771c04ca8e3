//! Requests accepted by the hub control loop.

use chorus_core::{Envelope, PeerId};
use tokio::sync::oneshot;

use crate::peer::Peer;

/// One request on the hub mailbox. Processed strictly one at a time.
#[derive(Debug)]
pub enum HubCommand {
    /// Add a peer and announce it to everyone else. `ack` receives whether
    /// the peer was admitted.
    Admit {
        /// Peer to add.
        peer: Peer,
        /// Admission outcome.
        ack: oneshot::Sender<bool>,
    },
    /// Remove a peer if present and announce the departure.
    Remove(PeerId),
    /// Fan an envelope out to every peer except `exclude`.
    Broadcast {
        /// Message to deliver.
        envelope: Envelope,
        /// Peer to skip, if any.
        exclude: Option<PeerId>,
    },
    /// Snapshot of the current peer identities.
    PeerIds(oneshot::Sender<Vec<PeerId>>),
}

impl HubCommand {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Admit { .. } => "admit",
            Self::Remove(_) => "remove",
            Self::Broadcast { .. } => "broadcast",
            Self::PeerIds(_) => "peer_ids",
        }
    }
}
