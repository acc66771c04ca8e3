//! # chorus-core
//!
//! Foundation types shared by every Chorus crate:
//!
//! - **Branded IDs**: [`PeerId`] as a newtype so peer identities never mix with other strings
//! - **Envelope**: the immutable `{sender, recipient, content}` wire unit exchanged with peers
//! - **Announcements**: the fixed system texts sent on admission and removal
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer for tests

#![deny(unsafe_code)]

pub mod envelope;
pub mod ids;
pub mod logging;

pub use envelope::{Announcement, Envelope};
pub use ids::PeerId;
