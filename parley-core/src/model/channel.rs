use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical data channels opened between two peers. Both are ordered and reliable.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Chat,
    File,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 2] = [ChannelKind::Chat, ChannelKind::File];

    pub fn label(self) -> &'static str {
        match self {
            ChannelKind::Chat => "chat",
            ChannelKind::File => "file",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "chat" => Some(ChannelKind::Chat),
            "file" => Some(ChannelKind::File),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
