//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so partial
//! JSON is accepted and missing fields keep their compiled default.

mod logging;
mod server;

pub use logging::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the Chorus hub.
///
/// ```json
/// {
///   "server": { "port": 9000, "outboundQueueCapacity": 64 },
///   "logging": { "level": "debug", "format": "json" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChorusSettings {
    /// Listener and hub settings.
    pub server: ServerSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl ChorusSettings {
    /// Reject values that would make the hub unusable.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if !server.ws_path.starts_with('/') {
            return Err(SettingsError::InvalidValue(format!(
                "wsPath must start with '/', got {:?}",
                server.ws_path
            )));
        }
        if server.outbound_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "outboundQueueCapacity must be at least 1".into(),
            ));
        }
        if server.mailbox_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "mailboxCapacity must be at least 1".into(),
            ));
        }
        if server.max_message_size == 0 {
            return Err(SettingsError::InvalidValue(
                "maxMessageSize must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
