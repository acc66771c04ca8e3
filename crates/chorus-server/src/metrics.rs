//! Prometheus metrics recorder and metric names.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the handle used to render `/metrics`. Call once at startup,
/// before any metric is recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Peers admitted (counter).
pub const HUB_PEERS_ADMITTED_TOTAL: &str = "hub_peers_admitted_total";
/// Peers removed through the remove path (counter).
pub const HUB_PEERS_REMOVED_TOTAL: &str = "hub_peers_removed_total";
/// Peers evicted because their outbound queue was full or closed (counter).
pub const HUB_PEERS_EVICTED_TOTAL: &str = "hub_peers_evicted_total";
/// Broadcast passes, announcements included (counter).
pub const HUB_BROADCASTS_TOTAL: &str = "hub_broadcasts_total";
/// Peers currently in the peer set (gauge).
pub const HUB_PEERS_ACTIVE: &str = "hub_peers_active";
