use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parley_core::{PeerId, RoomId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub peer_id: PeerId,
    pub display_name: Option<String>,
}

/// Room -> members mapping owned by the relay.
///
/// Every operation holds the room's map entry for its whole duration, so
/// operations on one room are serialized while other rooms proceed
/// independently. A room exists exactly as long as it has members.
#[derive(Default)]
pub struct PresenceDirectory {
    rooms: DashMap<RoomId, HashMap<PeerId, Option<String>>>,
}

impl PresenceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the member and returns the room's members after the join,
    /// the joiner included.
    pub fn join(
        &self,
        room: &RoomId,
        member_id: PeerId,
        display_name: Option<String>,
    ) -> Vec<Member> {
        let mut members = self.rooms.entry(room.clone()).or_default();
        members.insert(member_id, display_name);
        snapshot(&members)
    }

    /// Removes the member. Returns `true` if the room is now empty.
    pub fn leave(&self, room: &RoomId, member_id: &PeerId) -> bool {
        match self.rooms.entry(room.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().remove(member_id);
                if entry.get().is_empty() {
                    entry.remove();
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(_) => true,
        }
    }

    pub fn members(&self, room: &RoomId) -> Vec<Member> {
        self.rooms
            .get(room)
            .map(|members| snapshot(&members))
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

fn snapshot(members: &HashMap<PeerId, Option<String>>) -> Vec<Member> {
    members
        .iter()
        .map(|(peer_id, display_name)| Member {
            peer_id: peer_id.clone(),
            display_name: display_name.clone(),
        })
        .collect()
}
