//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::UserStatus;

/// A registered participant in the OpenChat platform.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique display name.
    pub name: String,
    /// Presence/status flag.
    pub status: UserStatus,
    /// Hex color hint used when rendering the user's messages, without
    /// a leading `#` (e.g. `"ffffff"`).
    pub color: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last seen on any connection.
    pub last_seen_at: DateTime<Utc>,
}

impl User {
    /// Check if the user may join rooms right now.
    pub fn can_join(&self) -> bool {
        self.status.can_join()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired display name.
    pub name: String,
    /// Hex color hint (defaults to white when omitted).
    pub color: Option<String>,
}

/// Data for updating an existing user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUser {
    /// The user ID to update.
    pub id: Uuid,
    /// New display name.
    pub name: Option<String>,
    /// New hex color hint.
    pub color: Option<String>,
    /// New status flag.
    pub status: Option<UserStatus>,
}
