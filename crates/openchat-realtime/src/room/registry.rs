//! Room directory — owns every open room.

use std::sync::Arc;

use dashmap::DashMap;

use crate::room::key::RoomKey;
use crate::room::room::{Room, RoomSummary};

/// Directory of all open rooms, keyed by room key.
///
/// Rooms are opened lazily on first use and stay listed once opened, even
/// when everyone has left. Lookups return shared handles; the registry
/// itself never touches room membership.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room key → room.
    rooms: DashMap<RoomKey, Arc<Room>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Returns the room for `key`, opening it if absent.
    ///
    /// `name` and `bus_subject` are only consulted when the room is opened
    /// here; an existing room keeps its name and routing descriptor. The
    /// flag reports whether this call opened it.
    pub fn open(
        &self,
        key: &RoomKey,
        name: Option<&str>,
        bus_subject: Option<String>,
    ) -> (Arc<Room>, bool) {
        let mut created = false;
        let room = self
            .rooms
            .entry(key.clone())
            .or_insert_with(|| {
                created = true;
                let name = name.unwrap_or(key.as_str()).to_string();
                Arc::new(Room::new(key.clone(), name, bus_subject))
            })
            .clone();
        (room, created)
    }

    /// Looks up an open room without opening it.
    pub fn get(&self, key: &RoomKey) -> Option<Arc<Room>> {
        self.rooms.get(key).map(|r| Arc::clone(&r))
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Listing of every open room with its current member count.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self.rooms.iter().map(|r| Arc::clone(&r)).collect();
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            summaries.push(room.summary().await);
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> RoomKey {
        RoomKey::parse(raw).unwrap()
    }

    #[test]
    fn test_open_creates_once_and_reuses() {
        let registry = RoomRegistry::new();

        let (first, created) = registry.open(&key("general"), Some("General"), None);
        assert!(created);
        assert_eq!(first.name, "General");

        let (again, created) = registry.open(&key("general"), Some("Renamed"), None);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(again.name, "General");
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_open_without_name_falls_back_to_key() {
        let registry = RoomRegistry::new();
        let (room, _) = registry.open(&key("dev-lounge"), None, None);
        assert_eq!(room.name, "dev-lounge");
    }

    #[test]
    fn test_open_pins_routing_descriptor_on_creation() {
        let registry = RoomRegistry::new();
        let (room, _) = registry.open(&key("general"), None, Some("rooms.general".to_string()));
        assert_eq!(room.bus_subject.as_deref(), Some("rooms.general"));

        let (again, _) = registry.open(&key("general"), None, None);
        assert_eq!(again.bus_subject.as_deref(), Some("rooms.general"));
    }

    #[test]
    fn test_get_does_not_open() {
        let registry = RoomRegistry::new();
        assert!(registry.get(&key("ghost")).is_none());
        assert_eq!(registry.room_count(), 0);

        registry.open(&key("ghost"), None, None);
        assert!(registry.get(&key("ghost")).is_some());
    }

    #[tokio::test]
    async fn test_list_rooms_reports_member_counts() {
        let registry = RoomRegistry::new();
        registry.open(&key("alpha"), Some("Alpha"), None);
        registry.open(&key("beta"), Some("Beta"), None);

        let mut listing = registry.list_rooms().await;
        listing.sort_by(|a, b| a.key.as_str().cmp(b.key.as_str()));
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "Alpha");
        assert_eq!(listing[0].members, 0);
    }
}
