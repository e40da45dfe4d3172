//! Single chat room with member tracking and fan-out dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::message::frame::ChatFrame;
use crate::room::identity::{Identity, IdentityPresence, IdentityProfile};
use crate::room::key::RoomKey;

/// Room-level failures surfaced to the caller.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    /// The identity does not hold the named connection in this room.
    #[error("identity does not hold connection {0}")]
    ConnectionNotHeld(ConnectionId),
}

/// Outcome of a successful member removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Last connection detached; the member left the room.
    Departed,
    /// Other devices remain attached; the member is still present.
    StillConnected {
        /// Connections still attached after removal.
        remaining: usize,
    },
}

/// Result of admitting a connection into a room.
#[derive(Debug, Clone)]
pub struct MemberAdmission {
    /// Canonical member the connection was bound to.
    pub identity: Arc<Identity>,
    /// Whether this connection made the user present (no prior devices).
    pub first_join: bool,
}

/// Aggregate outcome of a room dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Members the frame was offered to after rank filtering.
    pub members: usize,
    /// Connections the frame was queued on.
    pub connections: usize,
    /// Connections the frame could not be queued on.
    pub failures: usize,
}

/// Serializable room listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room key.
    pub key: RoomKey,
    /// Display name.
    pub name: String,
    /// Current member count.
    pub members: usize,
}

/// A single room: a display name plus the ordered set of present members.
///
/// Membership is keyed by user id. A user connecting from several devices
/// is one member holding several connections; the member departs only when
/// the last connection detaches. Members are kept in join order and
/// dispatch walks them in that order.
#[derive(Debug)]
pub struct Room {
    /// Stable room key.
    pub key: RoomKey,
    /// Human-readable name.
    pub name: String,
    /// Bus subject this room's lifecycle events are routed on, when a
    /// service bus is attached. `None` means the room publishes nothing.
    pub bus_subject: Option<String>,
    /// Members in join order. The lock serializes membership changes and
    /// pins the snapshot a dispatch works from.
    members: Mutex<Vec<Arc<Identity>>>,
}

impl Room {
    /// Creates an empty room.
    pub fn new(key: RoomKey, name: String, bus_subject: Option<String>) -> Self {
        Self {
            key,
            name,
            bus_subject,
            members: Mutex::new(Vec::new()),
        }
    }

    /// Admit a connection for the given profile.
    ///
    /// If a member with the same user id is already present the connection
    /// is bound to that member and `first_join` is `false`; otherwise a new
    /// member is appended and `first_join` is `true`. Re-admitting a
    /// connection id already held is a no-op at the connection level.
    pub async fn add_member(
        &self,
        profile: IdentityProfile,
        conn: Arc<ConnectionHandle>,
    ) -> MemberAdmission {
        let mut members = self.members.lock().await;

        if let Some(existing) = members.iter().find(|m| m.id == profile.id) {
            let identity = Arc::clone(existing);
            identity.add_connection(conn);
            return MemberAdmission {
                identity,
                first_join: false,
            };
        }

        let identity = Arc::new(Identity::from_profile(profile));
        identity.add_connection(conn);
        members.push(Arc::clone(&identity));
        MemberAdmission {
            identity,
            first_join: true,
        }
    }

    /// Detach a connection from a member.
    ///
    /// Fails with [`RoomError::ConnectionNotHeld`] when the member does not
    /// hold the connection, leaving membership untouched. On success the
    /// member is removed from the room only when no connections remain.
    pub async fn remove_member(
        &self,
        identity: &Arc<Identity>,
        conn_id: ConnectionId,
    ) -> Result<RemoveOutcome, RoomError> {
        let mut members = self.members.lock().await;

        if !identity.remove_connection(conn_id) {
            return Err(RoomError::ConnectionNotHeld(conn_id));
        }

        let remaining = identity.live_connection_count();
        if remaining > 0 {
            return Ok(RemoveOutcome::StillConnected { remaining });
        }

        members.retain(|m| !Arc::ptr_eq(m, identity));
        Ok(RemoveOutcome::Departed)
    }

    /// Fan a frame out to every present member, or only to members whose
    /// enabled grants reach `min_rank` in this room.
    ///
    /// The frame is serialized once. The member list is snapshotted under
    /// the lock and the lock is released before any queueing happens, so
    /// joins and departures racing the dispatch neither block nor tear the
    /// recipient set. Delivery is best effort per connection.
    pub async fn dispatch(&self, frame: &ChatFrame, min_rank: Option<i16>) -> DispatchReport {
        let text = match frame.to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(room = %self.key, error = %e, "Failed to serialize outbound frame");
                return DispatchReport::default();
            }
        };

        let recipients: Vec<Arc<Identity>> = {
            let members = self.members.lock().await;
            members
                .iter()
                .filter(|m| match min_rank {
                    Some(rank) => m.has_role_permission(rank, &self.key),
                    None => true,
                })
                .cloned()
                .collect()
        };

        let mut report = DispatchReport {
            members: recipients.len(),
            ..DispatchReport::default()
        };
        for member in &recipients {
            let delivery = member.broadcast_text(&text);
            report.connections += delivery.sent;
            report.failures += delivery.failed;
        }
        report
    }

    /// Current member count.
    pub async fn member_count(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Members in join order.
    pub async fn member_snapshot(&self) -> Vec<Arc<Identity>> {
        self.members.lock().await.clone()
    }

    /// Public presence view of every member, in join order.
    pub async fn presence_snapshot(&self) -> Vec<IdentityPresence> {
        self.members
            .lock()
            .await
            .iter()
            .map(|m| m.presence())
            .collect()
    }

    /// Listing entry for this room.
    pub async fn summary(&self) -> RoomSummary {
        RoomSummary {
            key: self.key.clone(),
            name: self.name.clone(),
            members: self.member_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::identity::RoleGrant;
    use openchat_entity::user::UserStatus;
    use uuid::Uuid;

    fn profile(name: &str, grants: Vec<RoleGrant>) -> IdentityProfile {
        IdentityProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: UserStatus::Active,
            color: "ffffff".to_string(),
            grants,
        }
    }

    fn room() -> Room {
        Room::new(RoomKey::parse("general").unwrap(), "General".to_string(), None)
    }

    #[tokio::test]
    async fn test_second_device_binds_to_existing_member() {
        let room = room();
        let user = profile("ada", Vec::new());
        let (c1, _r1) = ConnectionHandle::open(4);
        let (c2, _r2) = ConnectionHandle::open(4);

        let first = room.add_member(user.clone(), c1).await;
        assert!(first.first_join);

        let second = room.add_member(user, c2).await;
        assert!(!second.first_join);
        assert!(Arc::ptr_eq(&first.identity, &second.identity));
        assert_eq!(room.member_count().await, 1);
        assert_eq!(first.identity.live_connection_count(), 2);
    }

    #[tokio::test]
    async fn test_member_departs_with_last_connection_only() {
        let room = room();
        let user = profile("ada", Vec::new());
        let (c1, _r1) = ConnectionHandle::open(4);
        let (c2, _r2) = ConnectionHandle::open(4);
        let c1_id = c1.id;
        let c2_id = c2.id;

        let admission = room.add_member(user.clone(), c1).await;
        room.add_member(user, c2).await;

        let outcome = room.remove_member(&admission.identity, c1_id).await.unwrap();
        assert_eq!(outcome, RemoveOutcome::StillConnected { remaining: 1 });
        assert_eq!(room.member_count().await, 1);

        let outcome = room.remove_member(&admission.identity, c2_id).await.unwrap();
        assert_eq!(outcome, RemoveOutcome::Departed);
        assert_eq!(room.member_count().await, 0);
    }

    #[tokio::test]
    async fn test_removing_unheld_connection_fails_without_side_effects() {
        let room = room();
        let (c1, _r1) = ConnectionHandle::open(4);
        let admission = room.add_member(profile("ada", Vec::new()), c1).await;

        let stranger = Uuid::new_v4();
        let err = room.remove_member(&admission.identity, stranger).await;
        assert_eq!(err, Err(RoomError::ConnectionNotHeld(stranger)));
        assert_eq!(room.member_count().await, 1);
        assert_eq!(admission.identity.live_connection_count(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_device_of_every_member() {
        let room = room();
        let (a1, mut ra1) = ConnectionHandle::open(4);
        let (a2, mut ra2) = ConnectionHandle::open(4);
        let (b1, mut rb1) = ConnectionHandle::open(4);

        let ada = profile("ada", Vec::new());
        room.add_member(ada.clone(), a1).await;
        room.add_member(ada, a2).await;
        room.add_member(profile("brin", Vec::new()), b1).await;

        let report = room.dispatch(&ChatFrame::chat("hello"), None).await;
        assert_eq!(report.members, 2);
        assert_eq!(report.connections, 3);
        assert_eq!(report.failures, 0);

        let t1 = ra1.recv().await.unwrap();
        assert_eq!(ra2.recv().await.unwrap(), t1);
        assert_eq!(rb1.recv().await.unwrap(), t1);
    }

    #[tokio::test]
    async fn test_rank_filter_narrows_recipients() {
        let room = room();
        let (mod_conn, mut mod_rx) = ConnectionHandle::open(4);
        let (plain_conn, mut plain_rx) = ConnectionHandle::open(4);

        let moderator = profile(
            "mara",
            vec![RoleGrant {
                rank: 4,
                scope: None,
                enabled: true,
            }],
        );
        room.add_member(moderator, mod_conn).await;
        room.add_member(profile("pat", Vec::new()), plain_conn).await;

        let report = room.dispatch(&ChatFrame::admin("lockdown"), Some(4)).await;
        assert_eq!(report.members, 1);
        assert_eq!(report.connections, 1);

        assert!(mod_rx.recv().await.unwrap().contains("lockdown"));
        assert!(plain_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_to_empty_room_is_a_noop() {
        let room = room();
        let report = room.dispatch(&ChatFrame::chat("anyone?"), None).await;
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn test_dispatch_continues_past_failed_connections() {
        let room = room();
        let (dead, dead_rx) = ConnectionHandle::open(4);
        let (live, mut live_rx) = ConnectionHandle::open(4);
        drop(dead_rx);

        room.add_member(profile("gone", Vec::new()), dead).await;
        room.add_member(profile("here", Vec::new()), live).await;

        let report = room.dispatch(&ChatFrame::chat("onward"), None).await;
        assert_eq!(report.members, 2);
        assert_eq!(report.connections, 1);
        assert_eq!(report.failures, 1);
        assert!(live_rx.recv().await.unwrap().contains("onward"));
    }
}
