use crate::transport::TransportEvent;
use async_trait::async_trait;
use parley_core::{ChannelKind, IceCandidate, IceServerConfig, PeerId, SessionDescription};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Signaling state of the underlying peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalDescription {
    Description(SessionDescription),
    /// Discard the in-flight local offer and return to `Stable`.
    Rollback,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,

    #[error("channel '{0}' is not open")]
    ChannelNotOpen(ChannelKind),

    #[error("invalid description: {0}")]
    InvalidDescription(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// The peer-to-peer transport a link drives. Implementations own candidate
/// gathering, encryption and channel framing; the link only sequences
/// descriptions and candidates through this contract and listens for
/// [`TransportEvent`]s.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self, ice_restart: bool) -> TransportResult<SessionDescription>;

    async fn create_answer(&self) -> TransportResult<SessionDescription>;

    async fn set_local_description(&self, desc: LocalDescription) -> TransportResult<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> TransportResult<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> TransportResult<()>;

    fn signaling_state(&self) -> SignalingState;

    async fn has_remote_description(&self) -> bool;

    /// Opens an ordered, reliable channel. Opening a kind that already
    /// exists is a no-op.
    async fn open_channel(&self, kind: ChannelKind) -> TransportResult<()>;

    async fn send_text(&self, kind: ChannelKind, text: String) -> TransportResult<()>;

    async fn close(&self) -> TransportResult<()>;
}

/// Creates one transport per remote peer. Events of the new transport are
/// delivered on `events`.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        remote: &PeerId,
        events: mpsc::Sender<TransportEvent>,
    ) -> TransportResult<Arc<dyn PeerTransport>>;

    /// ICE servers announced by the relay.
    async fn update_ice_servers(&self, _servers: Vec<IceServerConfig>) {}
}
