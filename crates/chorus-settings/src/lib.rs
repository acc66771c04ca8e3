//! # chorus-settings
//!
//! Configuration management with layered sources for the Chorus hub.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ChorusSettings::default()`]
//! 2. **User file**: `~/.chorus/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CHORUS_*` overrides (highest priority)
//!
//! Settings are loaded once by the binary and passed down explicitly; there
//! is no global settings instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
