use bytes::Bytes;
use parley_core::{ChannelKind, IceCandidate};

/// Connectivity of the peer-to-peer path as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

/// Events a transport emits for the link that owns it.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local candidate was gathered and must be trickled to the remote peer.
    CandidateGenerated(IceCandidate),

    ConnectivityChanged(Connectivity),

    /// A channel, opened locally or by the remote peer, is ready for payloads.
    ChannelOpened(ChannelKind),

    ChannelClosed(ChannelKind),

    ChannelError(ChannelKind, String),

    Message(ChannelKind, Bytes),
}
