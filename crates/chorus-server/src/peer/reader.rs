//! Read loop: transport frames become hub broadcasts.

use std::fmt::Display;

use axum::extract::ws::Message;
use chorus_core::{Envelope, PeerId};
use futures::{Stream, StreamExt};
use tracing::{debug, trace};

use super::LoopExit;
use crate::hub::HubHandle;

/// Read frames from `inbound` until the stream ends, errors, or the remote
/// sends a close frame.
///
/// Each text or binary payload is broadcast to every peer, the sender
/// included. Binary payloads are decoded as lossy UTF-8. Control frames are
/// skipped. On exit the peer is removed from the hub.
pub async fn read_loop<S, E>(peer_id: PeerId, mut inbound: S, hub: HubHandle) -> LoopExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    debug!(peer_id = %peer_id, "read loop started");
    let exit = loop {
        let content = match inbound.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
            Some(Ok(Message::Close(_))) | None => break LoopExit::PeerClosed,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(peer_id = %peer_id, error = %e, "read failed");
                break LoopExit::TransportError;
            }
        };

        trace!(peer_id = %peer_id, len = content.len(), "inbound message");
        hub.broadcast(Envelope::from_peer(&peer_id, content), None)
            .await;
    };

    debug!(peer_id = %peer_id, ?exit, "read loop finished");
    hub.remove(peer_id).await;
    exit
}
