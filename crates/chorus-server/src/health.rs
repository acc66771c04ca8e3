//! `/health` endpoint body.

use std::time::Instant;

use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `"ok"` while the hub answers, `"unavailable"` once it has stopped.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Peers currently admitted, if the hub answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peers: Option<usize>,
}

impl HealthResponse {
    /// Whether the hub answered the peer-count query.
    pub fn is_ok(&self) -> bool {
        self.peers.is_some()
    }
}

/// Build a health response from the hub's peer count.
pub fn health_check(start_time: Instant, peers: Option<usize>) -> HealthResponse {
    HealthResponse {
        status: if peers.is_some() { "ok" } else { "unavailable" }.into(),
        uptime_secs: start_time.elapsed().as_secs(),
        peers,
    }
}
