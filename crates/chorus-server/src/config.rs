//! Server configuration.

use std::time::Duration;

use chorus_settings::ServerSettings;

/// Runtime configuration for a [`ChorusServer`](crate::server::ChorusServer).
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (`0` for auto-assign).
    pub port: u16,
    /// Path the WebSocket ingress is served at.
    pub ws_path: String,
    /// Capacity of each peer's outbound queue.
    pub outbound_queue_capacity: usize,
    /// Capacity of the hub's command mailbox.
    pub mailbox_capacity: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
    /// How long shutdown waits for tasks before giving up.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            ws_path: "/ws".into(),
            outbound_queue_capacity: 256,
            mailbox_capacity: 1024,
            max_message_size: 64 * 1024,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            ws_path: settings.ws_path.clone(),
            outbound_queue_capacity: settings.outbound_queue_capacity,
            mailbox_capacity: settings.mailbox_capacity,
            max_message_size: settings.max_message_size,
            shutdown_timeout: Duration::from_secs(settings.shutdown_timeout_secs),
        }
    }
}

impl ServerConfig {
    /// `host:port` string handed to the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
