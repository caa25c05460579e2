use serde::{Deserialize, Serialize};

/// Text frame carried on the `chat` channel: `{"type":"chat","msg":...,"ts":...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "chat")]
pub struct ChatPayload {
    pub msg: String,
    /// Unix time in milliseconds.
    pub ts: u64,
}

impl ChatPayload {
    pub fn new(msg: impl Into<String>, ts: u64) -> Self {
        Self {
            msg: msg.into(),
            ts,
        }
    }
}
