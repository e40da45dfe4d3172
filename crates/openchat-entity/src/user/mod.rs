//! User domain entities.

pub mod model;
pub mod platform;
pub mod role;
pub mod status;

pub use model::{CreateUser, UpdateUser, User};
pub use platform::{Platform, PlatformLink};
pub use role::{ChannelRole, RoleKind};
pub use status::UserStatus;
