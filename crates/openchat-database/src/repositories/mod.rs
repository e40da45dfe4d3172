//! Repository implementations for all OpenChat entities.

pub mod channel;
pub mod session_token;
pub mod user;

pub use channel::ChannelRepository;
pub use session_token::SessionTokenRepository;
pub use user::{ScopedRole, UserRepository};
