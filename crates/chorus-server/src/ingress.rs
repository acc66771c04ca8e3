//! WebSocket ingress: upgrade the request, mint an identity, hand the
//! connection to a peer session.

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chorus_core::PeerId;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::peer::{Peer, run_session};
use crate::server::AppState;

/// Body returned when a request on the WebSocket path cannot be upgraded.
pub const NOT_FOUND_BODY: &str = "404 page not found";

/// Upgrade handler mounted at the configured WebSocket path for every method.
///
/// Requests that are not valid upgrades get a plain 404 and never reach the
/// hub.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            debug!(%rejection, "websocket upgrade rejected");
            return (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response();
        }
    };

    ws.max_message_size(state.config.max_message_size)
        .on_failed_upgrade(|error| warn!(%error, "websocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let peer_id = PeerId::new();
    info!(peer_id = %peer_id, "websocket connected");

    let (peer, outbound) = Peer::new(peer_id.clone(), state.config.outbound_queue_capacity);
    let (sink, stream) = socket.split();
    let final_state = run_session(peer, outbound, sink, stream, state.hub.clone()).await;

    info!(peer_id = %peer_id, state = ?final_state, "websocket closed");
}
