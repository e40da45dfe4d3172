//! Connected participant identities.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openchat_core::types::UserId;
use openchat_entity::user::UserStatus;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::message::frame::ChatFrame;
use crate::room::key::RoomKey;

/// A role grant as seen by the realtime core.
///
/// Persisted grants reference channels by id; the session resolver
/// surfaces the channel slug here so `scope` compares directly against
/// room keys. `None` means the grant is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Numeric rank on the role ladder.
    pub rank: i16,
    /// Room the grant is scoped to, or `None` for a global grant.
    pub scope: Option<RoomKey>,
    /// Disabled grants confer nothing.
    pub enabled: bool,
}

/// Durable identity attributes handed over by the session resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProfile {
    /// Stable user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Presence/status flag.
    pub status: UserStatus,
    /// Hex color hint (no leading `#`).
    pub color: String,
    /// Role grants, in grant order.
    pub grants: Vec<RoleGrant>,
}

/// A participant as the realtime core sees them: durable attributes plus
/// the set of live connections currently attached.
///
/// Identities are reconstructed from persisted attributes at join time;
/// they are never live database objects. The connection set is mutated
/// only by [`Room`](crate::room::room::Room) operations while the owning
/// room's lock is held; `broadcast` may run concurrently and works on a
/// clone of the handle list.
#[derive(Debug)]
pub struct Identity {
    /// Stable user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Presence/status flag.
    pub status: UserStatus,
    /// Hex color hint.
    pub color: String,
    /// Role grants, in grant order.
    grants: Vec<RoleGrant>,
    /// Live connections, in attach order.
    connections: Mutex<Vec<Arc<ConnectionHandle>>>,
}

/// Per-identity outcome of a best-effort broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Frames queued successfully.
    pub sent: usize,
    /// Frames dropped (dead connection, full or closed queue).
    pub failed: usize,
}

impl Identity {
    /// Reconstruct an identity from resolved durable attributes.
    pub fn from_profile(profile: IdentityProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            status: profile.status,
            color: profile.color,
            grants: profile.grants,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Attach a connection. Idempotent per connection id.
    pub fn add_connection(&self, conn: Arc<ConnectionHandle>) {
        let mut connections = self.lock_connections();
        if connections.iter().any(|c| c.id == conn.id) {
            return;
        }
        connections.push(conn);
    }

    /// Detach a connection by id; returns whether it was held.
    pub fn remove_connection(&self, conn_id: ConnectionId) -> bool {
        let mut connections = self.lock_connections();
        let before = connections.len();
        connections.retain(|c| c.id != conn_id);
        connections.len() < before
    }

    /// Number of currently attached connections.
    pub fn live_connection_count(&self) -> usize {
        self.lock_connections().len()
    }

    /// Whether the given connection is attached.
    pub fn holds_connection(&self, conn_id: ConnectionId) -> bool {
        self.lock_connections().iter().any(|c| c.id == conn_id)
    }

    /// The role grants this identity carries.
    pub fn grants(&self) -> &[RoleGrant] {
        &self.grants
    }

    /// Pure rank predicate: does any enabled grant reach `min_rank` and
    /// apply to `room` (globally, or scoped to exactly that room)?
    pub fn has_role_permission(&self, min_rank: i16, room: &RoomKey) -> bool {
        self.grants.iter().any(|grant| {
            grant.enabled
                && grant.rank >= min_rank
                && grant.scope.as_ref().is_none_or(|scope| scope == room)
        })
    }

    /// Serialize the frame once and queue it on every live connection.
    ///
    /// Best effort: a failure on one connection never blocks the others.
    pub fn broadcast(&self, frame: &ChatFrame) -> DeliveryReport {
        match frame.to_text() {
            Ok(text) => self.broadcast_text(&text),
            Err(e) => {
                tracing::error!(user_id = %self.id, error = %e, "Failed to serialize frame");
                DeliveryReport::default()
            }
        }
    }

    /// Queue already-serialized text on every live connection.
    pub fn broadcast_text(&self, text: &str) -> DeliveryReport {
        let handles = self.lock_connections().clone();

        let mut report = DeliveryReport::default();
        for handle in handles {
            if handle.send(text.to_string()) {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }
        report
    }

    /// Serializable presence view of this identity.
    pub fn presence(&self) -> IdentityPresence {
        IdentityPresence {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            color: self.color.clone(),
        }
    }

    fn lock_connections(&self) -> std::sync::MutexGuard<'_, Vec<Arc<ConnectionHandle>>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshot of an identity's public attributes for presence payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityPresence {
    /// Stable user id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Presence/status flag.
    pub status: UserStatus,
    /// Hex color hint.
    pub color: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> RoomKey {
        RoomKey::parse(raw).unwrap()
    }

    fn identity(grants: Vec<RoleGrant>) -> Identity {
        Identity::from_profile(IdentityProfile {
            id: Uuid::new_v4(),
            name: "ada".to_string(),
            status: UserStatus::Active,
            color: "ff0000".to_string(),
            grants,
        })
    }

    #[tokio::test]
    async fn test_add_connection_is_idempotent() {
        let identity = identity(Vec::new());
        let (conn, _rx) = ConnectionHandle::open(4);

        identity.add_connection(conn.clone());
        identity.add_connection(conn.clone());
        assert_eq!(identity.live_connection_count(), 1);

        assert!(identity.remove_connection(conn.id));
        assert!(!identity.remove_connection(conn.id));
        assert_eq!(identity.live_connection_count(), 0);
    }

    #[test]
    fn test_global_grant_applies_everywhere() {
        let identity = identity(vec![RoleGrant {
            rank: 3,
            scope: None,
            enabled: true,
        }]);

        assert!(identity.has_role_permission(3, &key("general")));
        assert!(identity.has_role_permission(1, &key("another")));
        assert!(!identity.has_role_permission(4, &key("general")));
    }

    #[test]
    fn test_scoped_grant_applies_only_to_its_room() {
        let identity = identity(vec![RoleGrant {
            rank: 5,
            scope: Some(key("general")),
            enabled: true,
        }]);

        assert!(identity.has_role_permission(5, &key("general")));
        assert!(!identity.has_role_permission(5, &key("other-room")));
    }

    #[test]
    fn test_disabled_grant_confers_nothing() {
        let identity = identity(vec![RoleGrant {
            rank: 6,
            scope: None,
            enabled: false,
        }]);

        assert!(!identity.has_role_permission(1, &key("general")));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_connection() {
        let identity = identity(Vec::new());
        let (c1, mut rx1) = ConnectionHandle::open(4);
        let (c2, mut rx2) = ConnectionHandle::open(4);
        identity.add_connection(c1);
        identity.add_connection(c2);

        let frame = ChatFrame::chat("hello");
        let report = identity.broadcast(&frame);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);

        let t1 = rx1.recv().await.unwrap();
        let t2 = rx2.recv().await.unwrap();
        assert_eq!(t1, t2);
    }

    #[tokio::test]
    async fn test_broadcast_survives_one_dead_connection() {
        let identity = identity(Vec::new());
        let (dead, dead_rx) = ConnectionHandle::open(4);
        let (live, mut live_rx) = ConnectionHandle::open(4);
        identity.add_connection(dead);
        identity.add_connection(live);
        drop(dead_rx);

        let report = identity.broadcast(&ChatFrame::chat("still here"));
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        assert!(live_rx.recv().await.unwrap().contains("still here"));
    }
}
