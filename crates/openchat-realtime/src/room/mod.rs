//! Rooms, identities, and the room directory.

pub mod identity;
pub mod key;
pub mod registry;
pub mod room;

pub use identity::{DeliveryReport, Identity, IdentityPresence, IdentityProfile, RoleGrant};
pub use key::RoomKey;
pub use registry::RoomRegistry;
pub use room::{DispatchReport, MemberAdmission, RemoveOutcome, Room, RoomError, RoomSummary};
