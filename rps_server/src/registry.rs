// Room registry: the name → `Room` table.
//
// Owned by `GameServer` and only ever touched from the event-loop thread, so
// get-or-create is atomic by construction — two racing first-joins to the
// same name are just two sequential events, and the second one finds the room
// the first one created. Rooms are created on first join and removed the
// instant they empty; a later join under the same name gets a fresh room.

use std::collections::BTreeMap;

use crate::room::Room;

/// All active rooms, keyed by the user-chosen room name.
#[derive(Debug)]
pub struct Registry {
    rooms: BTreeMap<String, Room>,
    max_rounds: u32,
}

impl Registry {
    /// `max_rounds` is fixed at construction and applies to every room.
    pub fn new(max_rounds: u32) -> Self {
        Self {
            rooms: BTreeMap::new(),
            max_rounds,
        }
    }

    /// Return the room under `key`, creating an empty one if absent.
    pub fn get_or_create(&mut self, key: &str) -> &mut Room {
        self.rooms
            .entry(key.to_string())
            .or_insert_with(|| Room::new(self.max_rounds))
    }

    pub fn get(&self, key: &str) -> Option<&Room> {
        self.rooms.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Room> {
        self.rooms.get_mut(key)
    }

    /// Drop the room under `key` if it has no players left. Returns true if
    /// it was removed.
    pub fn remove_if_empty(&mut self, key: &str) -> bool {
        match self.rooms.get(key) {
            Some(room) if room.is_empty() => {
                self.rooms.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
