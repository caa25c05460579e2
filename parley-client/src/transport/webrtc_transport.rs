use crate::transport::{
    Connectivity, LocalDescription, PeerTransport, SignalingState, TransportError,
    TransportEvent, TransportFactory, TransportResult,
};
use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::utils::default_stun_urls;
use parley_core::{ChannelKind, IceCandidate, IceServerConfig, PeerId, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;

type Channels = Arc<DashMap<ChannelKind, Arc<RTCDataChannel>>>;

/// [`PeerTransport`] backed by a `webrtc` peer connection.
pub struct WebRtcTransport {
    remote: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    channels: Channels,
    events: mpsc::Sender<TransportEvent>,
}

impl WebRtcTransport {
    pub async fn new(
        remote: PeerId,
        ice_servers: &[IceServerConfig],
        events: mpsc::Sender<TransportEvent>,
    ) -> anyhow::Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );
        let channels: Channels = Arc::new(DashMap::new());

        let ice_tx = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(from_rtc_candidate(init)))
                    .await;
            })
        }));

        let state_tx = events.clone();
        let uid_state = remote.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    info!("ICE connection state for {}: {}", uid, s);
                    let Some(connectivity) = to_connectivity(s) else {
                        return;
                    };
                    let _ = tx
                        .send(TransportEvent::ConnectivityChanged(connectivity))
                        .await;
                })
            },
        ));

        let dc_tx = events.clone();
        let dc_channels = channels.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            let channels = dc_channels.clone();

            Box::pin(async move {
                debug!("Inbound data channel '{}'", dc.label());
                setup_data_channel(&channels, &tx, dc);
            })
        }));

        Ok(Self {
            remote,
            peer_connection,
            channels,
            events,
        })
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self, ice_restart: bool) -> TransportResult<SessionDescription> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self
            .peer_connection
            .create_offer(options)
            .await
            .map_err(backend)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> TransportResult<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(backend)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, desc: LocalDescription) -> TransportResult<()> {
        let rtc = match desc {
            LocalDescription::Description(desc) => to_rtc_description(&desc)?,
            LocalDescription::Rollback => {
                // Nothing pending means there is nothing to roll back.
                let Some(pending) = self.peer_connection.pending_local_description().await else {
                    return Ok(());
                };
                rtc_description(SdpKind::Rollback, pending.sdp)?
            }
        };

        self.peer_connection
            .set_local_description(rtc)
            .await
            .map_err(backend)
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> TransportResult<()> {
        let rtc = to_rtc_description(&desc)?;
        self.peer_connection
            .set_remote_description(rtc)
            .await
            .map_err(backend)
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> TransportResult<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .map_err(backend)
    }

    fn signaling_state(&self) -> SignalingState {
        match self.peer_connection.signaling_state() {
            RTCSignalingState::HaveLocalOffer => SignalingState::HaveLocalOffer,
            RTCSignalingState::HaveRemoteOffer => SignalingState::HaveRemoteOffer,
            RTCSignalingState::HaveLocalPranswer => SignalingState::HaveLocalPranswer,
            RTCSignalingState::HaveRemotePranswer => SignalingState::HaveRemotePranswer,
            RTCSignalingState::Closed => SignalingState::Closed,
            RTCSignalingState::Stable | RTCSignalingState::Unspecified => SignalingState::Stable,
        }
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    async fn open_channel(&self, kind: ChannelKind) -> TransportResult<()> {
        if self.channels.contains_key(&kind) {
            return Ok(());
        }

        let options = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(kind.label(), Some(options))
            .await
            .map_err(backend)?;

        debug!("Opened '{}' channel towards {}", kind, self.remote);
        setup_data_channel(&self.channels, &self.events, dc);
        Ok(())
    }

    async fn send_text(&self, kind: ChannelKind, text: String) -> TransportResult<()> {
        let Some(dc) = self.channels.get(&kind).map(|dc| dc.clone()) else {
            return Err(TransportError::ChannelNotOpen(kind));
        };
        dc.send_text(text).await.map_err(backend)?;
        Ok(())
    }

    async fn close(&self) -> TransportResult<()> {
        self.channels.clear();
        self.peer_connection.close().await.map_err(backend)
    }
}

fn setup_data_channel(
    channels: &Channels,
    events: &mpsc::Sender<TransportEvent>,
    dc: Arc<RTCDataChannel>,
) {
    let Some(kind) = ChannelKind::from_label(dc.label()) else {
        warn!("Ignoring data channel with unknown label '{}'", dc.label());
        return;
    };

    let tx_open = events.clone();
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            let _ = tx_open.send(TransportEvent::ChannelOpened(kind)).await;
        })
    }));

    let tx_close = events.clone();
    let channels_close = channels.clone();
    dc.on_close(Box::new(move || {
        let tx = tx_close.clone();
        channels_close.remove(&kind);
        Box::pin(async move {
            let _ = tx.send(TransportEvent::ChannelClosed(kind)).await;
        })
    }));

    let tx_err = events.clone();
    dc.on_error(Box::new(move |err: webrtc::Error| {
        let tx = tx_err.clone();
        Box::pin(async move {
            let _ = tx
                .send(TransportEvent::ChannelError(kind, err.to_string()))
                .await;
        })
    }));

    let tx_msg = events.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(kind, msg.data)).await;
        })
    }));

    channels.insert(kind, dc);
}

fn backend(e: webrtc::Error) -> TransportError {
    TransportError::Backend(e.into())
}

fn to_rtc_description(desc: &SessionDescription) -> TransportResult<RTCSessionDescription> {
    rtc_description(desc.kind, desc.sdp.clone())
}

fn rtc_description(kind: SdpKind, sdp: String) -> TransportResult<RTCSessionDescription> {
    let rtc = match kind {
        SdpKind::Offer => RTCSessionDescription::offer(sdp),
        SdpKind::Answer => RTCSessionDescription::answer(sdp),
        SdpKind::Pranswer => RTCSessionDescription::pranswer(sdp),
        SdpKind::Rollback => {
            return serde_json::from_value(serde_json::json!({ "type": "rollback", "sdp": sdp }))
                .map_err(|e| TransportError::InvalidDescription(e.to_string()));
        }
    };
    rtc.map_err(|e| TransportError::InvalidDescription(e.to_string()))
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn to_connectivity(state: RTCIceConnectionState) -> Option<Connectivity> {
    let connectivity = match state {
        RTCIceConnectionState::New => Connectivity::New,
        RTCIceConnectionState::Checking => Connectivity::Checking,
        RTCIceConnectionState::Connected => Connectivity::Connected,
        RTCIceConnectionState::Completed => Connectivity::Completed,
        RTCIceConnectionState::Disconnected => Connectivity::Disconnected,
        RTCIceConnectionState::Failed => Connectivity::Failed,
        RTCIceConnectionState::Closed => Connectivity::Closed,
        RTCIceConnectionState::Unspecified => return None,
    };
    Some(connectivity)
}

/// Builds [`WebRtcTransport`]s. Explicitly configured ICE servers win over
/// the list the relay announces.
pub struct WebRtcTransportFactory {
    ice_servers: RwLock<Vec<IceServerConfig>>,
    pinned: bool,
}

impl WebRtcTransportFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        let pinned = !ice_servers.is_empty();
        let ice_servers = if pinned {
            ice_servers
        } else {
            vec![IceServerConfig::stun(default_stun_urls())]
        };

        Self {
            ice_servers: RwLock::new(ice_servers),
            pinned,
        }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        remote: &PeerId,
        events: mpsc::Sender<TransportEvent>,
    ) -> TransportResult<Arc<dyn PeerTransport>> {
        let ice_servers = self.ice_servers.read().await.clone();
        let transport = WebRtcTransport::new(remote.clone(), &ice_servers, events).await?;
        Ok(Arc::new(transport))
    }

    async fn update_ice_servers(&self, servers: Vec<IceServerConfig>) {
        if self.pinned || servers.is_empty() {
            return;
        }
        debug!("Using {} ICE servers from relay", servers.len());
        *self.ice_servers.write().await = servers;
    }
}
