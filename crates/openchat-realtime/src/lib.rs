//! # openchat-realtime
//!
//! Room-based realtime fanout engine for OpenChat. Provides:
//!
//! - Room membership tracking with multi-device identities
//! - Rank-filtered, snapshot-isolated message dispatch
//! - The WebSocket join protocol (resolve, admit, presence, disconnect)
//! - Tagged wire frames with strict boundary validation
//! - Service event bus (in-memory, optional Redis relay)
//!
//! The engine never touches persistence directly: identities arrive
//! already reconstructed through the [`connection::manager::SessionResolver`]
//! seam.

pub mod bridge;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod room;

pub use bridge::{ServiceBus, ServiceEvent};
pub use connection::handle::{ConnectionHandle, ConnectionId};
pub use connection::manager::{
    ConnectionManager, JoinRejection, JoinedConnection, RejectCode, SessionResolver,
};
pub use message::frame::{ChatFrame, FrameError, FrameKind};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use room::identity::{Identity, IdentityPresence, IdentityProfile, RoleGrant};
pub use room::key::RoomKey;
pub use room::registry::RoomRegistry;
pub use room::room::{DispatchReport, RemoveOutcome, Room, RoomError, RoomSummary};
