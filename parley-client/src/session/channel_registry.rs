use crate::transport::PeerTransport;
use dashmap::DashMap;
use futures::future::join_all;
use parley_core::{ChannelKind, PeerId};
use std::sync::Arc;
use tracing::{debug, error};

/// Open channels of a session, keyed by remote identity and channel kind.
/// Cheap to clone; all clones share the same table.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    channels: Arc<DashMap<(PeerId, ChannelKind), Arc<dyn PeerTransport>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, peer_id: PeerId, kind: ChannelKind, transport: Arc<dyn PeerTransport>) {
        self.channels.insert((peer_id, kind), transport);
    }

    pub fn unregister(&self, peer_id: &PeerId, kind: ChannelKind) -> bool {
        self.channels.remove(&(peer_id.clone(), kind)).is_some()
    }

    pub fn contains(&self, peer_id: &PeerId, kind: ChannelKind) -> bool {
        self.channels.contains_key(&(peer_id.clone(), kind))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn clear(&self) {
        self.channels.clear();
    }

    /// Sends `text` on every open channel of `kind` and returns how many
    /// peers accepted it.
    pub async fn broadcast(&self, kind: ChannelKind, text: String) -> usize {
        // Collect first so no map guard is held across an await.
        let targets: Vec<(PeerId, Arc<dyn PeerTransport>)> = self
            .channels
            .iter()
            .filter(|entry| entry.key().1 == kind)
            .map(|entry| (entry.key().0.clone(), entry.value().clone()))
            .collect();

        let sends = targets.into_iter().map(|(peer_id, transport)| {
            let text = text.clone();
            async move {
                match transport.send_text(kind, text).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!("Broadcast to {} failed: {}", peer_id, e);
                        false
                    }
                }
            }
        });

        let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();
        debug!("Broadcast on '{}' reached {} peers", kind, delivered);
        delivered
    }
}
