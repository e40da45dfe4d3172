//! User status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Presence/status flag for a user.
///
/// Stored as a `smallint`; the discriminants are part of the persisted
/// format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Participating normally.
    Active = 0,
    /// Connected but idle.
    Away = 1,
    /// Connected, asked not to be disturbed.
    Busy = 2,
    /// Banned from the platform; may not join rooms.
    Banned = 3,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl UserStatus {
    /// Check if a user with this status may join rooms.
    pub fn can_join(&self) -> bool {
        !matches!(self, Self::Banned)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Away => "away",
            Self::Busy => "busy",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = openchat_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            "banned" => Ok(Self::Banned),
            _ => Err(openchat_core::AppError::validation(format!(
                "Invalid user status: '{s}'. Expected one of: active, away, busy, banned"
            ))),
        }
    }
}
