//! Connection handles and the join protocol.

pub mod handle;
pub mod manager;

pub use handle::{ConnectionHandle, ConnectionId};
pub use manager::{ConnectionManager, JoinRejection, JoinedConnection, RejectCode, SessionResolver};
