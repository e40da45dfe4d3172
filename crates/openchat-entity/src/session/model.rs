//! Session token entity model.
//!
//! Tokens use the selector/validator scheme: the selector is stored in the
//! clear and indexes the row, while only a salted hash of the validator is
//! persisted. The cookie value is `<selector>.<validator>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted session token row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionToken {
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Public lookup key carried in the cookie.
    pub selector: String,
    /// Hex-encoded SHA-512 of `salt_code || validator`.
    #[serde(skip_serializing)]
    pub hashed_validator: String,
    /// Per-token salt mixed into the validator hash.
    #[serde(skip_serializing)]
    pub salt_code: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl SessionToken {
    /// Check if the token is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A freshly issued session, including the one-time cleartext validator.
///
/// The validator exists only in this value and in the client's cookie; it
/// is never persisted or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    /// The user the session was issued for.
    pub user_id: Uuid,
    /// Public lookup key.
    pub selector: String,
    /// Cleartext validator to be placed in the cookie.
    pub validator: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl IssuedSession {
    /// Render the cookie value (`<selector>.<validator>`).
    pub fn cookie_value(&self) -> String {
        format!("{}.{}", self.selector, self.validator)
    }
}
