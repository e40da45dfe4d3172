//! Third-party platform identity links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Streaming platforms a user identity can be linked to.
///
/// Stored as a `smallint`; the discriminants are part of the persisted
/// format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// YouTube channel.
    Youtube = 0,
    /// Twitch channel.
    Twitch = 1,
    /// Kick channel.
    Kick = 2,
    /// Rumble channel.
    Rumble = 3,
    /// Discord server.
    Discord = 4,
    /// Catch-all for providers without a dedicated variant.
    Other = 5,
}

impl Platform {
    /// Return the platform as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
            Self::Twitch => "twitch",
            Self::Kick => "kick",
            Self::Rumble => "rumble",
            Self::Discord => "discord",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = openchat_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(Self::Youtube),
            "twitch" => Ok(Self::Twitch),
            "kick" => Ok(Self::Kick),
            "rumble" => Ok(Self::Rumble),
            "discord" => Ok(Self::Discord),
            "other" => Ok(Self::Other),
            _ => Err(openchat_core::AppError::validation(format!(
                "Invalid platform: '{s}'"
            ))),
        }
    }
}

/// A linked third-party identity.
///
/// One row per `(user, platform)` pair; the platform discriminates the
/// variant instead of one table per provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlatformLink {
    /// The linked user.
    pub user_id: Uuid,
    /// Which platform the external identity lives on.
    pub platform: Platform,
    /// The platform-side account identifier.
    pub external_id: String,
    /// The platform-side display name, if known.
    pub external_name: Option<String>,
    /// When the link was established.
    pub linked_at: DateTime<Utc>,
}
