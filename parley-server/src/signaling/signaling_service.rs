use crate::presence::{Member, PresenceDirectory};
use crate::signaling::RelayError;
use dashmap::DashMap;
use parley_core::{ClientMessage, IceServerConfig, PeerId, RelayMessage, RoomId, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Connection {
    tx: mpsc::UnboundedSender<RelayMessage>,
    room: Option<RoomId>,
    display_name: Option<String>,
}

struct SignalingInner {
    connections: DashMap<PeerId, Connection>,
    presence: PresenceDirectory,
    ice_servers: Vec<IceServerConfig>,
}

/// The signaling relay.
///
/// Tracks every live connection's identity and room, forwards envelopes by
/// target identity and announces arrivals and departures to room members.
/// Outbound frames go into each connection's own unbounded queue, so fan-out
/// never waits on a slow recipient.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                presence: PresenceDirectory::new(),
                ice_servers,
            }),
        }
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn presence(&self) -> &PresenceDirectory {
        &self.inner.presence
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Registers a new connection and assigns its identity. The connection
    /// is greeted with `welcome` and the relay's ICE server list.
    pub fn on_connect(&self, tx: mpsc::UnboundedSender<RelayMessage>) -> PeerId {
        let peer_id = PeerId::new();

        let _ = tx.send(RelayMessage::Welcome {
            peer_id: peer_id.clone(),
        });
        let _ = tx.send(RelayMessage::IceConfig {
            ice_servers: self.get_ice_servers(),
        });

        self.inner.connections.insert(
            peer_id.clone(),
            Connection {
                tx,
                room: None,
                display_name: None,
            },
        );

        debug!("Connection registered: {}", peer_id);
        peer_id
    }

    pub fn dispatch(&self, member: &PeerId, msg: ClientMessage) -> Result<(), RelayError> {
        match msg {
            ClientMessage::Join { room, display_name } => self.on_join(member, &room, display_name),
            ClientMessage::Signal { target, signal, .. } => self.on_signal(member, &target, signal),
        }
    }

    pub fn on_join(
        &self,
        member: &PeerId,
        room: &str,
        display_name: Option<String>,
    ) -> Result<(), RelayError> {
        let room = RoomId::parse(room).ok_or(RelayError::InvalidRoom)?;

        let previous = {
            let mut conn = self
                .inner
                .connections
                .get_mut(member)
                .ok_or_else(|| RelayError::UnknownConnection(member.clone()))?;
            conn.display_name = display_name.clone();
            conn.room.replace(room.clone())
        };

        if let Some(previous) = previous.filter(|prev| prev != &room) {
            self.leave_room(&previous, member);
        }

        let members = self.inner.presence.join(&room, member.clone(), display_name.clone());
        info!(
            "Peer {} joined room '{}' ({} members)",
            member,
            room,
            members.len()
        );

        if members.len() <= 1 {
            return Ok(());
        }

        for other in members.iter().filter(|m| &m.peer_id != member) {
            self.send_to(
                &other.peer_id,
                RelayMessage::Arrived {
                    peer_id: member.clone(),
                    display_name: display_name.clone(),
                },
            );
        }

        Ok(())
    }

    /// Forwards `signal` to `target`, stamped with the sender's recorded
    /// identity. Unknown targets are dropped without an error.
    pub fn on_signal(
        &self,
        sender: &PeerId,
        target: &PeerId,
        signal: SignalPayload,
    ) -> Result<(), RelayError> {
        if signal.is_empty() {
            return Err(RelayError::EmptySignal);
        }

        let sender_display_name = self
            .inner
            .connections
            .get(sender)
            .and_then(|conn| conn.display_name.clone());

        let delivered = self.send_to(
            target,
            RelayMessage::Signal {
                sender: sender.clone(),
                sender_display_name,
                signal,
            },
        );

        if !delivered {
            debug!("Dropping signal from {} to unknown target {}", sender, target);
        }

        Ok(())
    }

    /// Unregisters the connection and tells the rest of its room. Calling it
    /// again for the same identity does nothing.
    pub fn on_disconnect(&self, member: &PeerId) {
        let Some((_, conn)) = self.inner.connections.remove(member) else {
            return;
        };

        if let Some(room) = conn.room {
            self.leave_room(&room, member);
        }

        debug!("Connection removed: {}", member);
    }

    fn leave_room(&self, room: &RoomId, member: &PeerId) {
        if self.inner.presence.leave(room, member) {
            info!("Room '{}' is empty", room);
            return;
        }

        let remaining: Vec<Member> = self.inner.presence.members(room);
        for other in remaining {
            self.send_to(
                &other.peer_id,
                RelayMessage::Departed {
                    peer_id: member.clone(),
                },
            );
        }
    }

    fn send_to(&self, peer_id: &PeerId, msg: RelayMessage) -> bool {
        let Some(tx) = self
            .inner
            .connections
            .get(peer_id)
            .map(|conn| conn.tx.clone())
        else {
            return false;
        };

        if tx.send(msg).is_err() {
            warn!("Outbound queue closed for {}", peer_id);
            return false;
        }
        true
    }
}
