//! Role kinds and per-channel role grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The role ladder, ordered by ascending rank.
///
/// Stored as a `smallint`; the discriminants double as the default rank of
/// a grant of that kind and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Catch-all for roles with no platform meaning.
    Other = 0,
    /// Cosmetic role; grants nothing.
    Decoration = 1,
    /// Channel moderator.
    Mod = 2,
    /// Automated account.
    Bot = 3,
    /// Platform cleanup crew.
    Janitor = 4,
    /// Channel administrator.
    Admin = 5,
    /// Channel owner.
    Owner = 6,
}

impl RoleKind {
    /// The rank a grant of this kind carries by default.
    pub fn default_rank(&self) -> i16 {
        *self as i16
    }

    /// Map a stored rank back onto the ladder, if it lands on a kind.
    pub fn from_rank(rank: i16) -> Option<Self> {
        match rank {
            0 => Some(Self::Other),
            1 => Some(Self::Decoration),
            2 => Some(Self::Mod),
            3 => Some(Self::Bot),
            4 => Some(Self::Janitor),
            5 => Some(Self::Admin),
            6 => Some(Self::Owner),
            _ => None,
        }
    }

    /// Check if this kind ranks at least as high as `other`.
    pub fn has_at_least(&self, other: &RoleKind) -> bool {
        self.default_rank() >= other.default_rank()
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::Decoration => "decoration",
            Self::Mod => "mod",
            Self::Bot => "bot",
            Self::Janitor => "janitor",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = openchat_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "other" => Ok(Self::Other),
            "decoration" => Ok(Self::Decoration),
            "mod" => Ok(Self::Mod),
            "bot" => Ok(Self::Bot),
            "janitor" => Ok(Self::Janitor),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(openchat_core::AppError::validation(format!(
                "Invalid role kind: '{s}'. Expected one of: other, decoration, mod, bot, janitor, admin, owner"
            ))),
        }
    }
}

/// A role granted to a user, optionally scoped to a single channel.
///
/// A `channel_id` of `None` makes the grant global. The `rank` usually
/// matches `kind.default_rank()` but may be overridden per grant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChannelRole {
    /// The user holding the grant.
    pub user_id: Uuid,
    /// The channel the grant is scoped to, or `None` for a global grant.
    pub channel_id: Option<Uuid>,
    /// The kind of role granted.
    pub kind: RoleKind,
    /// Numeric rank used by dispatch filtering.
    pub rank: i16,
    /// Disabled grants are kept but confer nothing.
    pub enabled: bool,
    /// When the grant was issued.
    pub granted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_ordering() {
        assert!(RoleKind::Owner.has_at_least(&RoleKind::Mod));
        assert!(RoleKind::Janitor.has_at_least(&RoleKind::Janitor));
        assert!(!RoleKind::Decoration.has_at_least(&RoleKind::Mod));
        assert!(RoleKind::Bot.has_at_least(&RoleKind::Mod));
    }

    #[test]
    fn test_rank_round_trip() {
        for kind in [
            RoleKind::Other,
            RoleKind::Decoration,
            RoleKind::Mod,
            RoleKind::Bot,
            RoleKind::Janitor,
            RoleKind::Admin,
            RoleKind::Owner,
        ] {
            assert_eq!(RoleKind::from_rank(kind.default_rank()), Some(kind));
        }
        assert_eq!(RoleKind::from_rank(42), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("owner".parse::<RoleKind>().unwrap(), RoleKind::Owner);
        assert_eq!("JANITOR".parse::<RoleKind>().unwrap(), RoleKind::Janitor);
        assert!("helper".parse::<RoleKind>().is_err());
    }
}
