//! Listener and hub settings.

use serde::{Deserialize, Serialize};

/// Server network and hub sizing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listener port (`0` picks a free port).
    pub port: u16,
    /// Path the WebSocket ingress is served at.
    pub ws_path: String,
    /// Capacity of each peer's outbound queue. A peer whose queue is full at
    /// broadcast time is disconnected.
    pub outbound_queue_capacity: usize,
    /// Capacity of the hub's command mailbox.
    pub mailbox_capacity: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
    /// How long shutdown waits for in-flight connections.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            ws_path: "/ws".to_string(),
            outbound_queue_capacity: 256,
            mailbox_capacity: 1024,
            max_message_size: 64 * 1024,
            shutdown_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = ServerSettings::default();
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 4000);
        assert_eq!(s.ws_path, "/ws");
        assert_eq!(s.outbound_queue_capacity, 256);
        assert_eq!(s.mailbox_capacity, 1024);
        assert_eq!(s.max_message_size, 65_536);
        assert_eq!(s.shutdown_timeout_secs, 10);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"127.0.0.1","port":0,"wsPath":"/chat","outboundQueueCapacity":8}"#;
        let s: ServerSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.port, 0);
        assert_eq!(s.ws_path, "/chat");
        assert_eq!(s.outbound_queue_capacity, 8);
        assert_eq!(s.mailbox_capacity, 1024);
    }
}
