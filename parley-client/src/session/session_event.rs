use parley_core::{ChannelKind, PeerId};

/// What a [`Session`](crate::Session) reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PeerJoined {
        peer_id: PeerId,
        display_name: Option<String>,
    },

    PeerLeft {
        peer_id: PeerId,
    },

    ChannelOpened {
        peer_id: PeerId,
        kind: ChannelKind,
    },

    ChannelClosed {
        peer_id: PeerId,
        kind: ChannelKind,
    },

    Chat {
        from: PeerId,
        display_name: Option<String>,
        text: String,
        ts: u64,
    },

    /// ICE restarts towards this peer are exhausted. The link stays in place
    /// until the owner drops it or the session ends.
    LinkUnrecoverable {
        peer_id: PeerId,
    },
}
