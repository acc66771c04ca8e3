//! Branded ID newtypes.
//!
//! IDs are UUID v7 (time-ordered) generated via [`uuid::Uuid::now_v7`], so
//! two peers admitted by the same process never collide.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

branded_id! {
    /// Identity of one connected peer, assigned at admission and stable for
    /// the peer's lifetime.
    PeerId
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn new_ids_are_unique() {
        let ids: HashSet<PeerId> = (0..1_000).map(|_| PeerId::new()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn new_id_is_uuid_v7() {
        let id = PeerId::new();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn display_and_deref_match_inner() {
        let id = PeerId::from("peer-a");
        assert_eq!(id.to_string(), "peer-a");
        assert_eq!(&*id, "peer-a");
        assert_eq!(id.as_str(), "peer-a");
    }

    #[test]
    fn serializes_transparently() {
        let id = PeerId::from("peer-a");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""peer-a""#);
        let back: PeerId = serde_json::from_str(r#""peer-a""#).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn into_string() {
        let id = PeerId::from(String::from("peer-b"));
        let s: String = id.clone().into();
        assert_eq!(s, "peer-b");
        assert_eq!(id.into_inner(), "peer-b");
    }
}
