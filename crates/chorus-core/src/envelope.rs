//! The wire envelope exchanged with peers.
//!
//! Serialized as a JSON object with three optional text fields. Empty fields
//! are omitted, so a system announcement encodes as `{"content":"..."}` and a
//! peer message as `{"sender":"<id>","content":"..."}`.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::PeerId;

/// System announcements the hub emits on membership changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Announcement {
    /// A peer was admitted. Sent to every other peer.
    PeerConnected,
    /// A peer was removed. Sent to every remaining peer.
    PeerDisconnected,
}

impl Announcement {
    /// Announcement text carried in the envelope `content` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PeerConnected => "A new socket has connected.",
            Self::PeerDisconnected => "A socket has disconnected.",
        }
    }
}

/// Immutable unit of exchange between the hub and its peers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    sender: Option<PeerId>,
    /// Reserved. Routing is broadcast-only and never reads it.
    #[serde(
        default,
        deserialize_with = "non_empty_id",
        skip_serializing_if = "Option::is_none"
    )]
    recipient: Option<PeerId>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    content: String,
}

impl Envelope {
    /// Build an envelope from raw parts. Empty identities are treated as absent.
    pub fn new(
        sender: Option<PeerId>,
        recipient: Option<PeerId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.filter(|id| !id.is_empty()),
            recipient: recipient.filter(|id| !id.is_empty()),
            content: content.into(),
        }
    }

    /// A system announcement: no sender, content only.
    pub fn announcement(kind: Announcement) -> Self {
        Self::new(None, None, kind.as_str())
    }

    /// A message read from `sender`'s transport.
    pub fn from_peer(sender: &PeerId, content: impl Into<String>) -> Self {
        Self::new(Some(sender.clone()), None, content)
    }

    /// Sending peer, absent for system announcements.
    pub fn sender(&self) -> Option<&PeerId> {
        self.sender.as_ref()
    }

    /// Reserved recipient field.
    pub fn recipient(&self) -> Option<&PeerId> {
        self.recipient.as_ref()
    }

    /// Text payload.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether this envelope is a system announcement.
    pub fn is_announcement(&self) -> bool {
        self.sender.is_none()
    }

    /// Serialize once into a shared frame.
    ///
    /// The returned `Arc<str>` is cloned into every recipient's queue, so all
    /// recipients of one broadcast see identical bytes.
    pub fn encode(&self) -> Result<Arc<str>, serde_json::Error> {
        serde_json::to_string(self).map(Arc::from)
    }
}

/// Decodes `""` and `null` alike as an absent identity.
fn non_empty_id<'de, D>(deserializer: D) -> Result<Option<PeerId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<PeerId>::deserialize(deserializer)?.filter(|id| !id.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn as_json(envelope: &Envelope) -> Value {
        serde_json::from_str(&envelope.encode().unwrap()).unwrap()
    }

    #[test]
    fn announcement_sets_only_content() {
        let env = Envelope::announcement(Announcement::PeerConnected);
        assert_eq!(as_json(&env), json!({"content": "A new socket has connected."}));
        assert!(env.is_announcement());
    }

    #[test]
    fn disconnect_announcement_text() {
        let env = Envelope::announcement(Announcement::PeerDisconnected);
        assert_eq!(env.content(), "A socket has disconnected.");
    }

    #[test]
    fn peer_message_sets_sender_and_content() {
        let sender = PeerId::from("A");
        let env = Envelope::from_peer(&sender, "hello");
        assert_eq!(as_json(&env), json!({"sender": "A", "content": "hello"}));
        assert_eq!(env.sender(), Some(&sender));
        assert!(!env.is_announcement());
    }

    #[test]
    fn empty_fields_are_omitted() {
        let env = Envelope::new(Some(PeerId::from("")), None, "");
        assert_eq!(env.encode().unwrap().as_ref(), "{}");
    }

    #[test]
    fn recipient_is_carried_when_set() {
        let env = Envelope::new(Some("A".into()), Some("B".into()), "psst");
        let value = as_json(&env);
        assert_eq!(value["recipient"], "B");
        assert_eq!(env.recipient().map(PeerId::as_str), Some("B"));
    }

    #[test]
    fn decodes_with_missing_fields() {
        let env: Envelope = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(env.content(), "hi");
        assert!(env.sender().is_none());
        assert!(env.recipient().is_none());

        let empty: Envelope = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Envelope::default());
    }

    #[test]
    fn empty_ids_decode_as_absent() {
        let env: Envelope =
            serde_json::from_str(r#"{"sender":"","recipient":"","content":"x"}"#).unwrap();
        assert!(env.sender().is_none());
        assert!(env.recipient().is_none());
        assert_eq!(env.encode().unwrap().as_ref(), r#"{"content":"x"}"#);

        let null: Envelope = serde_json::from_str(r#"{"sender":null}"#).unwrap();
        assert_eq!(null, Envelope::default());
    }

    #[test]
    fn encode_is_stable() {
        let env = Envelope::from_peer(&PeerId::from("A"), "same bytes");
        assert_eq!(env.encode().unwrap(), env.encode().unwrap());
    }
}
