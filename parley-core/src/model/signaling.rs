use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(urls: Vec<String>) -> Self {
        Self {
            urls,
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the browser's `RTCSessionDescriptionInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    #[serde(default)]
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickled network candidate in the browser's `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        default,
        rename = "sdpMLineIndex",
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Negotiation payload relayed between peers. The relay treats it as opaque
/// apart from requiring at least one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<SessionDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<IceCandidate>,
}

impl SignalPayload {
    pub fn offer(desc: SessionDescription) -> Self {
        Self {
            offer: Some(desc),
            ..Default::default()
        }
    }

    pub fn answer(desc: SessionDescription) -> Self {
        Self {
            answer: Some(desc),
            ..Default::default()
        }
    }

    pub fn candidate(candidate: IceCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offer.is_none() && self.answer.is_none() && self.candidate.is_none()
    }
}

/// Frames a client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    Join {
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Signal {
        target: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_display_name: Option<String>,
        signal: SignalPayload,
    },
}

/// Frames the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RelayMessage {
    /// First frame on every connection: the identity the relay assigned.
    Welcome { peer_id: PeerId },
    IceConfig { ice_servers: Vec<IceServerConfig> },
    /// A new member joined the room. Only pre-existing members receive it.
    Arrived {
        peer_id: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Signal {
        sender: PeerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_display_name: Option<String>,
        signal: SignalPayload,
    },
    Departed { peer_id: PeerId },
}
