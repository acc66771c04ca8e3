//! The hub: single owner of the peer set and sole fan-out point.
//!
//! One long-lived task runs [`Hub::run`]. Every membership change and every
//! broadcast arrives as a [`HubCommand`] on one mailbox and is applied to
//! completion before the next is read, so the peer set needs no lock and no
//! request ever observes another half-applied.
//!
//! Backpressure policy: delivery is a non-blocking enqueue. A peer whose
//! queue is full (or already closed) is evicted during the same pass and the
//! eviction is announced like any other removal.

pub mod command;
pub mod handle;

pub use command::HubCommand;
pub use handle::HubHandle;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chorus_core::{Announcement, Envelope, PeerId};
use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::metrics::{
    HUB_BROADCASTS_TOTAL, HUB_PEERS_ACTIVE, HUB_PEERS_ADMITTED_TOTAL, HUB_PEERS_EVICTED_TOTAL,
    HUB_PEERS_REMOVED_TOTAL,
};
use crate::peer::Peer;

/// The hub control loop state.
pub struct Hub {
    peers: HashMap<PeerId, Peer>,
    mailbox: mpsc::Receiver<HubCommand>,
    shutdown: CancellationToken,
}

impl Hub {
    /// Create a hub and the handle that feeds its mailbox.
    pub fn new(mailbox_capacity: usize, shutdown: CancellationToken) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
        let hub = Self {
            peers: HashMap::new(),
            mailbox: rx,
            shutdown,
        };
        (hub, HubHandle::new(tx))
    }

    /// Create a hub and run it on its own task.
    pub fn spawn(mailbox_capacity: usize, shutdown: CancellationToken) -> (HubHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(mailbox_capacity, shutdown);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process commands until shutdown is requested or every handle is gone.
    ///
    /// On exit every remaining peer is dropped, closing its outbound queue so
    /// its write loop sends a close frame.
    #[instrument(skip_all, name = "hub")]
    pub async fn run(mut self) {
        info!("hub control loop started");
        loop {
            tokio::select! {
                command = self.mailbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                () = self.shutdown.cancelled() => break,
            }
        }

        let remaining = self.peers.len();
        self.peers.clear();
        self.record_size();
        info!(remaining, "hub control loop stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Admit { peer, ack } => {
                let _ = ack.send(self.admit(peer));
            }
            HubCommand::Remove(peer_id) => self.remove(&peer_id),
            HubCommand::Broadcast { envelope, exclude } => {
                self.broadcast(&envelope, exclude.as_ref());
            }
            HubCommand::PeerIds(reply) => {
                let _ = reply.send(self.peers.keys().cloned().collect());
            }
        }
    }

    fn admit(&mut self, peer: Peer) -> bool {
        let peer_id = peer.id().clone();
        match self.peers.entry(peer_id.clone()) {
            Entry::Occupied(_) => {
                // Dropping the newcomer closes its queue; the incumbent stays.
                warn!(peer_id = %peer_id, "duplicate peer id, admission refused");
                return false;
            }
            Entry::Vacant(slot) => {
                let _ = slot.insert(peer);
            }
        }

        counter!(HUB_PEERS_ADMITTED_TOTAL).increment(1);
        self.record_size();
        info!(peer_id = %peer_id, peers = self.peers.len(), "peer admitted");

        self.broadcast(
            &Envelope::announcement(Announcement::PeerConnected),
            Some(&peer_id),
        );
        true
    }

    fn remove(&mut self, peer_id: &PeerId) {
        let Some(peer) = self.peers.remove(peer_id) else {
            debug!(peer_id = %peer_id, "remove for absent peer ignored");
            return;
        };
        drop(peer);

        counter!(HUB_PEERS_REMOVED_TOTAL).increment(1);
        self.record_size();
        info!(peer_id = %peer_id, peers = self.peers.len(), "peer removed");

        self.broadcast(&Envelope::announcement(Announcement::PeerDisconnected), None);
    }

    /// Deliver `envelope`, then announce every eviction it caused. An
    /// announcement can itself evict, so departures are drained until none
    /// are left.
    fn broadcast(&mut self, envelope: &Envelope, exclude: Option<&PeerId>) {
        let mut departures = self.deliver(envelope, exclude);
        if departures == 0 {
            return;
        }

        let farewell = Envelope::announcement(Announcement::PeerDisconnected);
        while departures > 0 {
            departures -= 1;
            departures += self.deliver(&farewell, None);
        }
    }

    /// One encode and one fan-out pass; returns the number of evictions.
    fn deliver(&mut self, envelope: &Envelope, exclude: Option<&PeerId>) -> usize {
        let frame = match envelope.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode envelope, broadcast skipped");
                return 0;
            }
        };
        counter!(HUB_BROADCASTS_TOTAL).increment(1);
        self.fan_out(&frame, exclude)
    }

    /// Offer `frame` to every peer except `exclude`; returns how many peers
    /// were evicted because their queue would not take it.
    fn fan_out(&mut self, frame: &Arc<str>, exclude: Option<&PeerId>) -> usize {
        let before = self.peers.len();
        let mut recipients = 0usize;

        self.peers.retain(|peer_id, peer| {
            if exclude == Some(peer_id) {
                return true;
            }
            match peer.try_deliver(frame) {
                Ok(()) => {
                    recipients += 1;
                    true
                }
                Err(reason) => {
                    warn!(peer_id = %peer_id, %reason, "evicting peer that is not draining");
                    false
                }
            }
        });

        let evicted = before - self.peers.len();
        if evicted > 0 {
            counter!(HUB_PEERS_EVICTED_TOTAL).increment(evicted as u64);
            self.record_size();
        }
        debug!(recipients, evicted, "fan-out complete");
        evicted
    }

    #[allow(clippy::cast_precision_loss)]
    fn record_size(&self) {
        gauge!(HUB_PEERS_ACTIVE).set(self.peers.len() as f64);
    }
}
