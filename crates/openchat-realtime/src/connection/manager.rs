//! Connection manager — drives the join protocol and per-frame routing.
//!
//! The manager owns no sockets. The transport layer hands it an opaque
//! session reference and a room key, gets back a joined connection plus
//! the outbound receiver, and then feeds it inbound text until the
//! socket closes. Every state transition of the join protocol lives
//! here; rooms only ever see admitted members.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use openchat_core::config::realtime::RealtimeConfig;
use openchat_core::result::AppResult;

use crate::bridge::{ServiceBus, ServiceEvent};
use crate::message::frame::{ChatFrame, FrameKind};
use crate::metrics::EngineMetrics;
use crate::room::identity::{Identity, IdentityProfile};
use crate::room::key::RoomKey;
use crate::room::registry::RoomRegistry;
use crate::room::room::{RemoveOutcome, Room, RoomError};

use super::handle::ConnectionHandle;

/// Resolves an opaque session reference into identity attributes.
///
/// Implementations live outside the realtime core; resolution failures
/// (`Err`) are distinguished from an absent or expired session (`Ok(None)`).
#[async_trait]
pub trait SessionResolver: Send + Sync + std::fmt::Debug {
    /// Resolve a session reference to a profile, if the session is valid.
    async fn resolve(&self, session_ref: &str) -> AppResult<Option<IdentityProfile>>;
}

/// Machine-readable join rejection codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCode {
    /// No session, or the session did not resolve.
    Unauthenticated,
    /// The resolved identity is not allowed to join.
    Forbidden,
    /// The room key failed validation.
    InvalidRoomKey,
    /// The resolver collaborator failed.
    Unavailable,
}

impl RejectCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCode::Unauthenticated => "UNAUTHENTICATED",
            RejectCode::Forbidden => "FORBIDDEN",
            RejectCode::InvalidRoomKey => "INVALID_ROOM_KEY",
            RejectCode::Unavailable => "UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for RejectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected join: one error frame goes out, then the transport closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRejection {
    /// Machine-readable code.
    pub code: RejectCode,
    /// Human-readable reason.
    pub reason: String,
}

impl JoinRejection {
    fn new(code: RejectCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// The single error frame sent before closing.
    pub fn to_frame(&self) -> ChatFrame {
        ChatFrame::error(self.code.as_str(), self.reason.clone())
    }
}

/// A connection that completed the join protocol.
#[derive(Debug, Clone)]
pub struct JoinedConnection {
    /// Room the connection joined.
    pub room: Arc<Room>,
    /// Canonical member the connection is bound to.
    pub identity: Arc<Identity>,
    /// Write handle for this connection.
    pub handle: Arc<ConnectionHandle>,
    /// Whether this connection made the user present.
    pub first_join: bool,
}

/// Drives join, frame routing and teardown for every room socket.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Room directory.
    registry: Arc<RoomRegistry>,
    /// Session resolution collaborator.
    resolver: Arc<dyn SessionResolver>,
    /// Service bus, when enabled.
    bus: Option<Arc<ServiceBus>>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        registry: Arc<RoomRegistry>,
        resolver: Arc<dyn SessionResolver>,
        bus: Option<Arc<ServiceBus>>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            registry,
            resolver,
            bus,
            metrics,
            config,
        }
    }

    /// How long session resolution may take before the join is rejected.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.config.handshake_timeout_seconds)
    }

    /// The room directory this manager admits into.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Engine metrics.
    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Run the join protocol for one incoming connection.
    ///
    /// Resolves the session under the handshake deadline, validates the
    /// room key, opens the room if absent and admits the connection. On
    /// rejection the caller sends `rejection.to_frame()` and closes;
    /// nothing was registered. Membership mutates only after the deadline
    /// can no longer fire, so callers must not wrap this future in their
    /// own timeout: a cancelled join would strand the admitted member.
    pub async fn join(
        &self,
        session_ref: Option<&str>,
        raw_key: &str,
        room_name: Option<&str>,
    ) -> Result<(JoinedConnection, mpsc::Receiver<String>), JoinRejection> {
        let session_ref = match session_ref {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(self.reject(
                    RejectCode::Unauthenticated,
                    "no session presented",
                    raw_key,
                ));
            }
        };

        let resolved = timeout(self.handshake_timeout(), self.resolver.resolve(session_ref)).await;
        let profile = match resolved {
            Ok(Ok(Some(profile))) => profile,
            Ok(Ok(None)) => {
                return Err(self.reject(
                    RejectCode::Unauthenticated,
                    "session did not resolve",
                    raw_key,
                ));
            }
            Ok(Err(e)) => {
                error!(error = %e, "Session resolver failed");
                return Err(self.reject(
                    RejectCode::Unavailable,
                    "session resolution unavailable",
                    raw_key,
                ));
            }
            Err(_) => {
                return Err(self.reject(
                    RejectCode::Unavailable,
                    "session resolution timed out",
                    raw_key,
                ));
            }
        };

        if !profile.status.can_join() {
            return Err(self.reject(RejectCode::Forbidden, "account cannot join rooms", raw_key));
        }

        let key = match RoomKey::parse(raw_key) {
            Ok(key) => key,
            Err(e) => {
                return Err(self.reject(RejectCode::InvalidRoomKey, e.to_string(), raw_key));
            }
        };

        let bus_subject = self.bus.as_ref().map(|bus| bus.subject_for(&key));
        let (room, created) = self.registry.open(&key, room_name, bus_subject);
        let (handle, rx) = ConnectionHandle::open(self.config.connection_buffer_size);
        let admission = room.add_member(profile, handle.clone()).await;

        self.metrics.record_connect();

        if created {
            self.publish_room_event(
                &room,
                ServiceEvent::room_opened(key.clone(), room.name.clone()),
            )
            .await;
        }

        info!(
            conn_id = %handle.id,
            user_id = %admission.identity.id,
            room = %key,
            first_join = admission.first_join,
            "Connection joined room"
        );

        Ok((
            JoinedConnection {
                room,
                identity: admission.identity,
                handle,
                first_join: admission.first_join,
            },
            rx,
        ))
    }

    /// Finish the join on the wire: send the room snapshot to the new
    /// connection only, and announce presence to the room when this was
    /// the identity's first device.
    pub async fn complete_join(&self, joined: &JoinedConnection) {
        let members = joined.room.presence_snapshot().await;
        let snapshot = ChatFrame::state(
            "room_state",
            Some(json!({
                "room": joined.room.key,
                "name": joined.room.name,
                "members": members,
            })),
        );
        self.send_to_handle(joined, &snapshot);

        if !joined.first_join {
            return;
        }

        let payload = match serde_json::to_value(joined.identity.presence()) {
            Ok(v) => Some(v),
            Err(e) => {
                error!(error = %e, "Failed to serialize presence payload");
                None
            }
        };
        let announce = ChatFrame::event("member_joined", payload);
        let report = joined.room.dispatch(&announce, None).await;
        self.metrics.record_dispatch(&report);

        self.publish_room_event(
            &joined.room,
            ServiceEvent::member_joined(
                joined.room.key.clone(),
                joined.identity.id,
                joined.identity.name.clone(),
            ),
        )
        .await;
    }

    /// Route one inbound text frame from a joined connection.
    ///
    /// Malformed or out-of-place frames earn the sender an error frame
    /// and leave the connection open. Valid frames fan out through the
    /// room; admin frames are rank-gated on both the sender and the
    /// recipients.
    pub async fn handle_frame(&self, joined: &JoinedConnection, raw: &str) {
        if raw.len() > self.config.max_frame_bytes {
            self.metrics.record_rejected_frame();
            self.send_to_handle(
                joined,
                &ChatFrame::error("FRAME_TOO_LARGE", "frame exceeds size limit"),
            );
            return;
        }

        let frame = match ChatFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics.record_rejected_frame();
                debug!(conn_id = %joined.handle.id, error = %e, "Rejected inbound frame");
                self.send_to_handle(joined, &ChatFrame::error("MALFORMED_FRAME", e.to_string()));
                return;
            }
        };

        self.metrics.record_frame_in();

        match frame.kind() {
            FrameKind::Chat | FrameKind::Event => {
                let report = joined.room.dispatch(&frame, None).await;
                self.metrics.record_dispatch(&report);
            }
            FrameKind::Admin => {
                let min_rank = self.config.admin_min_rank;
                if !joined.identity.has_role_permission(min_rank, &joined.room.key) {
                    self.metrics.record_rejected_frame();
                    self.send_to_handle(
                        joined,
                        &ChatFrame::error("FORBIDDEN", "admin frames require a privileged role"),
                    );
                    return;
                }
                let report = joined.room.dispatch(&frame, Some(min_rank)).await;
                self.metrics.record_dispatch(&report);
            }
            FrameKind::State | FrameKind::Error => {
                self.metrics.record_rejected_frame();
                self.send_to_handle(
                    joined,
                    &ChatFrame::error("UNSUPPORTED_INBOUND", "frame type is server-issued"),
                );
            }
        }
    }

    /// Tear a connection down after the transport closed.
    ///
    /// Removal runs exactly once per connection; a connection the member
    /// no longer holds means a duplicate-close race, which is logged and
    /// counted, never raised.
    pub async fn finish(&self, joined: &JoinedConnection) {
        joined.handle.mark_dead();

        match joined
            .room
            .remove_member(&joined.identity, joined.handle.id)
            .await
        {
            Ok(RemoveOutcome::Departed) => {
                self.metrics.record_disconnect();
                info!(
                    conn_id = %joined.handle.id,
                    user_id = %joined.identity.id,
                    room = %joined.room.key,
                    "Member departed room"
                );

                let payload = match serde_json::to_value(joined.identity.presence()) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        error!(error = %e, "Failed to serialize presence payload");
                        None
                    }
                };
                let announce = ChatFrame::event("member_departed", payload);
                let report = joined.room.dispatch(&announce, None).await;
                self.metrics.record_dispatch(&report);

                self.publish_room_event(
                    &joined.room,
                    ServiceEvent::member_departed(
                        joined.room.key.clone(),
                        joined.identity.id,
                        joined.identity.name.clone(),
                    ),
                )
                .await;
            }
            Ok(RemoveOutcome::StillConnected { remaining }) => {
                self.metrics.record_disconnect();
                debug!(
                    conn_id = %joined.handle.id,
                    user_id = %joined.identity.id,
                    room = %joined.room.key,
                    remaining,
                    "Device detached, member still present"
                );
            }
            Err(RoomError::ConnectionNotHeld(conn_id)) => {
                self.metrics.record_state_inconsistency();
                warn!(
                    conn_id = %conn_id,
                    user_id = %joined.identity.id,
                    room = %joined.room.key,
                    "Duplicate close for connection not held"
                );
            }
        }
    }

    /// Publish a lifecycle event on the room's routing descriptor, when
    /// both a bus and a descriptor exist.
    async fn publish_room_event(&self, room: &Room, event: ServiceEvent) {
        if let (Some(bus), Some(subject)) = (&self.bus, room.bus_subject.as_deref()) {
            bus.publish_on(subject, event).await;
        }
    }

    fn reject(&self, code: RejectCode, reason: impl Into<String>, raw_key: &str) -> JoinRejection {
        let rejection = JoinRejection::new(code, reason);
        self.metrics.record_rejected_join();
        warn!(
            code = %rejection.code,
            reason = %rejection.reason,
            room = %raw_key,
            "Join rejected"
        );
        rejection
    }

    fn send_to_handle(&self, joined: &JoinedConnection, frame: &ChatFrame) {
        match frame.to_text() {
            Ok(text) => {
                let delivered = joined.handle.send(text);
                self.metrics.record_direct_send(delivered);
            }
            Err(e) => {
                error!(conn_id = %joined.handle.id, error = %e, "Failed to serialize outbound frame");
            }
        }
    }
}
