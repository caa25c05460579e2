use dashmap::DashMap;
use parley_core::PeerId;
use std::sync::Arc;

/// Remote members this session has heard of, with their display names.
#[derive(Clone, Default)]
pub struct Roster {
    members: Arc<DashMap<PeerId, Option<String>>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or refreshes a member. A `None` name never overwrites a known
    /// one. Returns `true` if the member was not known before.
    pub fn upsert(&self, peer_id: PeerId, display_name: Option<String>) -> bool {
        match self.members.get_mut(&peer_id) {
            Some(mut entry) => {
                if display_name.is_some() {
                    *entry = display_name;
                }
                false
            }
            None => {
                self.members.insert(peer_id, display_name);
                true
            }
        }
    }

    pub fn remove(&self, peer_id: &PeerId) -> bool {
        self.members.remove(peer_id).is_some()
    }

    pub fn display_name(&self, peer_id: &PeerId) -> Option<String> {
        self.members.get(peer_id).and_then(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&self) {
        self.members.clear();
    }
}
