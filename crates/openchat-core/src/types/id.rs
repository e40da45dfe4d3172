//! Identifier aliases shared across the workspace.
//!
//! Persisted rows and realtime identities use the same UUID space; the
//! aliases keep signatures readable without wrapping every id in a newtype.

use uuid::Uuid;

/// Identifier of a persisted user / realtime identity.
pub type UserId = Uuid;

/// Identifier of a persisted channel.
pub type ChannelId = Uuid;
