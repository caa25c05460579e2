use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Connection-scoped identity assigned by the relay.
///
/// Identities are opaque strings; ordering is plain lexicographic string
/// ordering, which is what the politeness tie-break relies on.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tie-break role of the local side of a link during offer collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Rolls back its own offer and accepts the remote one.
    Polite,
    /// Ignores colliding remote offers; its own offer wins.
    Impolite,
}

impl Role {
    /// The side whose identity sorts lower is impolite.
    pub fn for_pair(local: &PeerId, remote: &PeerId) -> Self {
        if local < remote {
            Role::Impolite
        } else {
            Role::Polite
        }
    }

    pub fn is_polite(self) -> bool {
        self == Role::Polite
    }
}
