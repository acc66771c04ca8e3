//! Session driver: admits a peer and supervises its two loops.

use std::fmt::Display;
use std::time::Duration;

use axum::extract::ws::Message;
use chorus_core::PeerId;
use futures::{Sink, Stream};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{LoopExit, OutboundQueue, Peer, PeerState, read_loop, write_loop};
use crate::hub::HubHandle;

/// How long the surviving loop gets to finish after its partner exits.
pub const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Admit `peer`, run its read and write loops, and return once both are
/// done.
///
/// A peer the hub refuses goes straight to `Closed`: the client gets a close
/// frame and no loop runs. Otherwise either loop exiting moves the peer to
/// `Closing`. The other loop is given
/// [`CLOSE_GRACE`] to wind down (the read loop usually needs the remote's
/// close reply) and is aborted after that.
pub async fn run_session<S, E, K>(
    peer: Peer,
    outbound: OutboundQueue,
    sink: K,
    stream: S,
    hub: HubHandle,
) -> PeerState
where
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: Display + Send,
{
    let peer_id = peer.id().clone();
    let mut state = PeerState::Connecting;

    if !hub.admit(peer).await {
        // The hub dropped the peer, so the queue is already closed and the
        // writer only sends the close frame. The read loop never starts, so
        // nothing is removed under this id.
        warn!(peer_id = %peer_id, "peer not admitted, closing transport");
        drop(stream);
        let _ = write_loop(peer_id.clone(), outbound, sink, hub).await;
        return advance(&peer_id, state, PeerState::Closed);
    }
    state = advance(&peer_id, state, PeerState::Active);

    let mut writer = tokio::spawn(write_loop(peer_id.clone(), outbound, sink, hub.clone()));
    let mut reader = tokio::spawn(read_loop(peer_id.clone(), stream, hub));

    let read_first = tokio::select! {
        exit = &mut reader => {
            debug!(peer_id = %peer_id, exit = ?exit.ok(), "read side ended first");
            true
        }
        exit = &mut writer => {
            debug!(peer_id = %peer_id, exit = ?exit.ok(), "write side ended first");
            false
        }
    };
    let survivor = if read_first { writer } else { reader };
    state = advance(&peer_id, state, PeerState::Closing);

    wind_down(&peer_id, survivor).await;
    advance(&peer_id, state, PeerState::Closed)
}

async fn wind_down(peer_id: &PeerId, mut survivor: JoinHandle<LoopExit>) {
    match tokio::time::timeout(CLOSE_GRACE, &mut survivor).await {
        Ok(exit) => debug!(peer_id = %peer_id, exit = ?exit.ok(), "second loop ended"),
        Err(_) => {
            debug!(peer_id = %peer_id, "second loop still running after grace period, aborting");
            survivor.abort();
        }
    }
}

fn advance(peer_id: &PeerId, state: PeerState, next: PeerState) -> PeerState {
    match state.transition(next) {
        Ok(next) => {
            debug!(peer_id = %peer_id, from = ?state, to = ?next, "peer state changed");
            next
        }
        Err(e) => {
            warn!(peer_id = %peer_id, error = %e, "ignoring lifecycle step");
            state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fmpsc;
    use futures::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;

    use crate::hub::Hub;

    type Inbound = fmpsc::UnboundedSender<Result<Message, &'static str>>;

    struct Harness {
        hub: HubHandle,
        inbound: Inbound,
        written: fmpsc::UnboundedReceiver<Message>,
        session: JoinHandle<PeerState>,
    }

    async fn start(id: &str) -> Harness {
        let (hub, _task) = Hub::spawn(16, CancellationToken::new());
        let (peer, outbound) = Peer::new(PeerId::from(id), 16);
        let (inbound, stream) = fmpsc::unbounded();
        let (sink, written) = fmpsc::unbounded();
        let session = tokio::spawn(run_session(peer, outbound, sink, stream, hub.clone()));
        Harness {
            hub,
            inbound,
            written,
            session,
        }
    }

    async fn wait_for_peers(hub: &HubHandle, count: usize) {
        for _ in 0..200 {
            if hub.peer_count().await == Ok(count) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("hub never reached {count} peers");
    }

    #[tokio::test]
    async fn echo_then_remote_close() {
        let mut h = start("s").await;
        wait_for_peers(&h.hub, 1).await;

        h.inbound.send(Ok(Message::Text("ping".into()))).await.unwrap();
        let echoed = h.written.next().await.unwrap();
        let Message::Text(text) = echoed else {
            panic!("expected text frame, got {echoed:?}");
        };
        let value: Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value, json!({"sender": "s", "content": "ping"}));

        h.inbound.send(Ok(Message::Close(None))).await.unwrap();

        assert_eq!(h.session.await.unwrap(), PeerState::Closed);
        assert_eq!(h.written.next().await, Some(Message::Close(None)));
        assert_eq!(h.hub.peer_count().await, Ok(0));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_reader_is_aborted_after_grace() {
        let mut h = start("s").await;
        wait_for_peers(&h.hub, 1).await;

        // Removal closes the queue; the reader never sees a close reply.
        h.hub.remove(PeerId::from("s")).await;

        assert_eq!(h.session.await.unwrap(), PeerState::Closed);
        assert_eq!(h.written.next().await, Some(Message::Close(None)));
    }

    #[tokio::test]
    async fn refused_duplicate_leaves_incumbent_in_place() {
        let (hub, _task) = Hub::spawn(16, CancellationToken::new());
        let (incumbent, _incumbent_queue) = Peer::new(PeerId::from("x"), 16);
        assert!(hub.admit(incumbent).await);

        let (duplicate, outbound) = Peer::new(PeerId::from("x"), 16);
        let (_inbound, stream) = fmpsc::unbounded::<Result<Message, &'static str>>();
        let (sink, written) = fmpsc::unbounded();

        let state = run_session(duplicate, outbound, sink, stream, hub.clone()).await;

        assert_eq!(state, PeerState::Closed);
        let frames: Vec<Message> = written.collect().await;
        assert_eq!(frames, vec![Message::Close(None)]);
        assert_eq!(hub.peer_ids().await.unwrap(), vec![PeerId::from("x")]);
    }

    #[tokio::test]
    async fn stopped_hub_closes_the_session() {
        let token = CancellationToken::new();
        let (hub, task) = Hub::spawn(4, token.clone());
        token.cancel();
        task.await.unwrap();

        let (peer, outbound) = Peer::new(PeerId::from("late"), 4);
        let (_inbound, stream) = fmpsc::unbounded::<Result<Message, &'static str>>();
        let (sink, written) = fmpsc::unbounded();

        let state = run_session(peer, outbound, sink, stream, hub).await;

        assert_eq!(state, PeerState::Closed);
        assert_eq!(written.collect::<Vec<_>>().await, vec![Message::Close(None)]);
    }

    #[test]
    fn illegal_step_keeps_current_state() {
        let id = PeerId::from("s");
        assert_eq!(
            advance(&id, PeerState::Connecting, PeerState::Closing),
            PeerState::Connecting
        );
        assert_eq!(
            advance(&id, PeerState::Active, PeerState::Closing),
            PeerState::Closing
        );
    }
}
