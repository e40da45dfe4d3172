//! Service bus for room lifecycle events.
//!
//! Joins, departures and room openings are published as [`ServiceEvent`]s
//! on a per-room subject so other parts of the process (and, with the
//! `bus-relay` feature, other nodes via Redis) can observe them. The bus
//! sits beside the dispatch path, never in it: publishing is best effort
//! and a slow or absent observer cannot stall a room.

pub mod memory;
pub mod relay;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use openchat_core::config::realtime::BusConfig;

use crate::room::key::RoomKey;

pub use memory::MemoryBus;
pub use relay::RedisRelay;

/// Room lifecycle event published on the service bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// A room was opened in the directory.
    RoomOpened {
        /// Room key.
        room: RoomKey,
        /// Display name it was opened with.
        name: String,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// A user became present in a room (first device attached).
    MemberJoined {
        /// Room key.
        room: RoomKey,
        /// User id.
        user_id: Uuid,
        /// Display name.
        name: String,
        /// When it happened.
        at: DateTime<Utc>,
    },
    /// A user left a room (last device detached).
    MemberDeparted {
        /// Room key.
        room: RoomKey,
        /// User id.
        user_id: Uuid,
        /// Display name.
        name: String,
        /// When it happened.
        at: DateTime<Utc>,
    },
}

impl ServiceEvent {
    /// Room-opened event stamped now.
    pub fn room_opened(room: RoomKey, name: impl Into<String>) -> Self {
        ServiceEvent::RoomOpened {
            room,
            name: name.into(),
            at: Utc::now(),
        }
    }

    /// Member-joined event stamped now.
    pub fn member_joined(room: RoomKey, user_id: Uuid, name: impl Into<String>) -> Self {
        ServiceEvent::MemberJoined {
            room,
            user_id,
            name: name.into(),
            at: Utc::now(),
        }
    }

    /// Member-departed event stamped now.
    pub fn member_departed(room: RoomKey, user_id: Uuid, name: impl Into<String>) -> Self {
        ServiceEvent::MemberDeparted {
            room,
            user_id,
            name: name.into(),
            at: Utc::now(),
        }
    }

    /// The room this event concerns.
    pub fn room(&self) -> &RoomKey {
        match self {
            ServiceEvent::RoomOpened { room, .. }
            | ServiceEvent::MemberJoined { room, .. }
            | ServiceEvent::MemberDeparted { room, .. } => room,
        }
    }
}

/// Process-wide service bus: in-memory fan-out plus an optional Redis
/// relay for multi-node deployments.
#[derive(Debug)]
pub struct ServiceBus {
    /// Subject prefix, e.g. `rooms` → subject `rooms.general`.
    subject_prefix: String,
    /// In-process fan-out.
    memory: MemoryBus,
    /// Cross-node relay, when configured.
    relay: Option<RedisRelay>,
}

impl ServiceBus {
    /// Build a bus from configuration. The relay is attached only when a
    /// Redis URL is configured and the `bus-relay` feature is compiled in.
    pub fn new(config: &BusConfig) -> Self {
        let relay = if cfg!(feature = "bus-relay") && !config.redis_url.is_empty() {
            Some(RedisRelay::new(&config.redis_url))
        } else {
            None
        };

        Self {
            subject_prefix: config.subject_prefix.clone(),
            memory: MemoryBus::new(config.buffer_size),
            relay,
        }
    }

    /// Subject the given room's events are published on.
    pub fn subject_for(&self, room: &RoomKey) -> String {
        format!("{}.{}", self.subject_prefix, room)
    }

    /// Publish an event on its room's subject. Best effort: relay
    /// failures are logged and never propagated.
    pub async fn publish(&self, event: ServiceEvent) {
        let subject = self.subject_for(event.room());
        self.publish_on(&subject, event).await;
    }

    /// Publish an event on an explicit subject, e.g. the routing
    /// descriptor a room was opened with.
    pub async fn publish_on(&self, subject: &str, event: ServiceEvent) {
        if let Some(relay) = &self.relay {
            match serde_json::to_string(&event) {
                Ok(payload) => {
                    if let Err(e) = relay.publish(subject, &payload).await {
                        tracing::warn!(subject = %subject, error = %e, "Service event relay failed");
                    }
                }
                Err(e) => {
                    tracing::error!(subject = %subject, error = %e, "Failed to serialize service event");
                }
            }
        }

        self.memory.publish(subject, event).await;
    }

    /// Subscribe to one room's events.
    pub async fn subscribe(&self, room: &RoomKey) -> broadcast::Receiver<ServiceEvent> {
        self.memory.subscribe(&self.subject_for(room)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> ServiceBus {
        ServiceBus::new(&BusConfig {
            enabled: true,
            subject_prefix: "rooms".to_string(),
            buffer_size: 8,
            redis_url: String::new(),
        })
    }

    #[tokio::test]
    async fn test_subscriber_sees_room_events() {
        let bus = bus();
        let key = RoomKey::parse("general").unwrap();
        let mut rx = bus.subscribe(&key).await;

        bus.publish(ServiceEvent::member_joined(key.clone(), Uuid::new_v4(), "ada"))
            .await;

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ServiceEvent::MemberJoined { name, .. } if name == "ada"));
    }

    #[tokio::test]
    async fn test_rooms_are_isolated_subjects() {
        let bus = bus();
        let general = RoomKey::parse("general").unwrap();
        let other = RoomKey::parse("other").unwrap();
        let mut rx = bus.subscribe(&other).await;

        bus.publish(ServiceEvent::room_opened(general, "General")).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_subject_naming() {
        let bus = bus();
        let key = RoomKey::parse("dev-lounge").unwrap();
        assert_eq!(bus.subject_for(&key), "rooms.dev-lounge");
    }
}
