//! Write loop: outbound queue frames become transport text frames.

use std::fmt::Display;

use axum::extract::ws::Message;
use chorus_core::PeerId;
use futures::{Sink, SinkExt};
use tracing::{debug, warn};

use super::{LoopExit, OutboundQueue};
use crate::hub::HubHandle;

/// Drain `outbound` into `sink` until the hub closes the queue or a write
/// fails.
///
/// A closed queue means the hub has removed the peer: a close frame is sent
/// and the loop ends. A failed write removes the peer from the hub so it
/// stops being offered frames. The sink is closed on every exit path.
pub async fn write_loop<K>(
    peer_id: PeerId,
    mut outbound: OutboundQueue,
    mut sink: K,
    hub: HubHandle,
) -> LoopExit
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    debug!(peer_id = %peer_id, "write loop started");
    let exit = loop {
        let Some(frame) = outbound.recv().await else {
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(peer_id = %peer_id, error = %e, "close frame not sent");
            }
            break LoopExit::QueueClosed;
        };

        if let Err(e) = sink.send(Message::Text(frame.as_ref().into())).await {
            warn!(peer_id = %peer_id, error = %e, "write failed, removing peer");
            hub.remove(peer_id.clone()).await;
            break LoopExit::TransportError;
        }
    };

    let _ = sink.close().await;
    debug!(peer_id = %peer_id, ?exit, "write loop finished");
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::StreamExt;
    use futures::channel::mpsc as fmpsc;
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;

    use crate::hub::Hub;
    use crate::peer::Peer;

    fn idle_hub() -> HubHandle {
        Hub::spawn(8, CancellationToken::new()).0
    }

    #[tokio::test]
    async fn frames_are_written_then_close_on_queue_close() {
        let (peer, queue) = Peer::new(PeerId::from("w"), 8);
        peer.try_deliver(&Arc::from("one")).unwrap();
        peer.try_deliver(&Arc::from("two")).unwrap();
        drop(peer);
        let (sink, received) = fmpsc::unbounded();

        let exit = write_loop(PeerId::from("w"), queue, sink, idle_hub()).await;

        assert_eq!(exit, LoopExit::QueueClosed);
        let written: Vec<Message> = received.collect().await;
        assert_eq!(
            written,
            vec![
                Message::Text("one".into()),
                Message::Text("two".into()),
                Message::Close(None),
            ]
        );
    }

    #[tokio::test]
    async fn failed_write_removes_peer_from_hub() {
        let (hub, _task) = Hub::spawn(8, CancellationToken::new());
        let (observer, mut observed) = Peer::new(PeerId::from("obs"), 8);
        let (writer, queue) = Peer::new(PeerId::from("w"), 8);
        assert!(hub.admit(observer).await);
        assert!(hub.admit(writer).await);
        hub.broadcast(chorus_core::Envelope::from_peer(&PeerId::from("obs"), "x"), None)
            .await;
        let (sink, received) = fmpsc::unbounded::<Message>();
        drop(received);

        let exit = write_loop(PeerId::from("w"), queue, sink, hub.clone()).await;

        assert_eq!(exit, LoopExit::TransportError);
        assert_eq!(hub.peer_ids().await.unwrap(), vec![PeerId::from("obs")]);
        let last: Value = serde_json::from_str(&observed.drain_ready().pop().unwrap()).unwrap();
        assert_eq!(last, json!({"content": "A socket has disconnected."}));
    }
}
