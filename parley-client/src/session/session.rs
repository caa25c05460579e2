use crate::negotiation::{LinkCommand, LinkShared, RestartPolicy};
use crate::session::link_handle::LinkHandle;
use crate::session::{ChannelRegistry, Roster, SessionEvent};
use crate::signal_sink::SignalSink;
use crate::transport::TransportFactory;
use parley_core::{ChannelKind, ChatPayload, PeerId, RelayMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// One client's presence in a room.
///
/// Owns one [`PeerLink`](crate::PeerLink) per remote identity it learns
/// about, routes relay frames to them, and reports roster, channel and chat
/// activity as [`SessionEvent`]s.
pub struct Session {
    local_id: PeerId,
    factory: Arc<dyn TransportFactory>,
    shared: LinkShared,
    links: HashMap<PeerId, LinkHandle>,
    /// Links that were told to shut down and have not finished yet.
    retiring: JoinSet<()>,
    closed: bool,
}

impl Session {
    pub fn new(
        local_id: PeerId,
        factory: Arc<dyn TransportFactory>,
        signals: Arc<dyn SignalSink>,
        policy: RestartPolicy,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            local_id,
            factory,
            shared: LinkShared {
                signals,
                channels: ChannelRegistry::new(),
                roster: Roster::new(),
                events,
                policy,
            },
            links: HashMap::new(),
            retiring: JoinSet::new(),
            closed: false,
        }
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn roster(&self) -> &Roster {
        &self.shared.roster
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.shared.channels
    }

    pub fn has_link(&self, peer_id: &PeerId) -> bool {
        self.links.contains_key(peer_id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn handle_relay_message(&mut self, msg: RelayMessage) {
        if self.closed {
            return;
        }

        match msg {
            RelayMessage::Welcome { peer_id } => {
                debug!("Relay welcome for {}", peer_id);
            }

            RelayMessage::IceConfig { ice_servers } => {
                self.factory.update_ice_servers(ice_servers).await;
            }

            RelayMessage::Arrived {
                peer_id,
                display_name,
            } => {
                if peer_id == self.local_id {
                    return;
                }
                self.note_member(peer_id.clone(), display_name);
                self.connect_to(peer_id);
            }

            RelayMessage::Signal {
                sender,
                sender_display_name,
                signal,
            } => {
                if sender == self.local_id {
                    return;
                }
                self.note_member(sender.clone(), sender_display_name);
                self.link_for(&sender).send(LinkCommand::Remote(signal));
            }

            RelayMessage::Departed { peer_id } => {
                if self.shared.roster.remove(&peer_id) {
                    let _ = self.shared.events.send(SessionEvent::PeerLeft {
                        peer_id: peer_id.clone(),
                    });
                }
                self.drop_peer(&peer_id);
            }
        }
    }

    /// Starts negotiation towards `peer_id`, creating its link if needed.
    pub fn connect_to(&mut self, peer_id: PeerId) {
        if self.closed {
            return;
        }
        self.link_for(&peer_id).send(LinkCommand::Negotiate);
    }

    /// Forgets the link to `peer_id` and tells it to shut down without
    /// waiting for it. Returns whether one existed.
    pub fn drop_peer(&mut self, peer_id: &PeerId) -> bool {
        let Some(link) = self.links.remove(peer_id) else {
            return false;
        };

        while self.retiring.try_join_next().is_some() {}
        self.retiring.spawn(link.retire());
        for kind in ChannelKind::ALL {
            self.shared.channels.unregister(peer_id, kind);
        }
        info!("Dropped link to {}", peer_id);
        true
    }

    /// Sends a chat line to every peer with an open chat channel. Returns how
    /// many peers it reached.
    pub async fn send_chat(&self, text: &str) -> usize {
        let payload = ChatPayload::new(text, now_ms());
        let frame = match serde_json::to_string(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode chat payload: {}", e);
                return 0;
            }
        };

        self.shared.channels.broadcast(ChannelKind::Chat, frame).await
    }

    /// Shuts every link down and waits for them, including links dropped
    /// earlier that are still closing. Calling it again does nothing.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let links: Vec<LinkHandle> = self.links.drain().map(|(_, link)| link).collect();
        info!("Shutting down session with {} links", links.len());

        for link in links {
            self.retiring.spawn(link.retire());
        }
        while self.retiring.join_next().await.is_some() {}

        self.shared.channels.clear();
        self.shared.roster.clear();
    }

    fn note_member(&self, peer_id: PeerId, display_name: Option<String>) {
        if self.shared.roster.upsert(peer_id.clone(), display_name.clone()) {
            let _ = self.shared.events.send(SessionEvent::PeerJoined {
                peer_id,
                display_name,
            });
        }
    }

    fn link_for(&mut self, peer_id: &PeerId) -> &LinkHandle {
        self.links.entry(peer_id.clone()).or_insert_with(|| {
            debug!("Creating link to {}", peer_id);
            LinkHandle::spawn(
                self.local_id.clone(),
                peer_id.clone(),
                self.factory.clone(),
                self.shared.clone(),
            )
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
