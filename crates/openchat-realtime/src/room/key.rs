//! Validated room keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a raw room key was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomKeyError {
    /// The key was empty (or whitespace only).
    #[error("room key is empty")]
    Empty,
    /// The key was outside the accepted length range.
    #[error("room key must be between {min} and {max} characters", min = RoomKey::MIN_LEN, max = RoomKey::MAX_LEN)]
    Length,
    /// The key contained a character outside `[a-z0-9_-]`.
    #[error("room key may only contain lowercase letters, digits, '-' and '_'")]
    Charset,
}

/// The addressing key of a room, normally a channel slug.
///
/// Keys are normalized to lowercase and validated on construction, so a
/// `RoomKey` in hand is always well-formed. Unknown-but-valid keys are
/// fine; the directory creates rooms for them lazily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    /// Minimum accepted key length, matching the channel slug rules.
    pub const MIN_LEN: usize = 3;
    /// Maximum accepted key length, matching the channel slug rules.
    pub const MAX_LEN: usize = 32;

    /// Parse and normalize a raw key from an upgrade path.
    pub fn parse(raw: &str) -> Result<Self, RoomKeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RoomKeyError::Empty);
        }

        let normalized = trimmed.to_lowercase();
        if normalized.len() < Self::MIN_LEN || normalized.len() > Self::MAX_LEN {
            return Err(RoomKeyError::Length);
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(RoomKeyError::Charset);
        }

        Ok(Self(normalized))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomKey {
    type Err = RoomKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let key = RoomKey::parse("  General ").unwrap();
        assert_eq!(key.as_str(), "general");
        assert_eq!(RoomKey::parse("general").unwrap(), key);
    }

    #[test]
    fn test_parse_rejects_bad_keys() {
        assert_eq!(RoomKey::parse(""), Err(RoomKeyError::Empty));
        assert_eq!(RoomKey::parse("   "), Err(RoomKeyError::Empty));
        assert_eq!(RoomKey::parse("ab"), Err(RoomKeyError::Length));
        assert_eq!(RoomKey::parse(&"x".repeat(33)), Err(RoomKeyError::Length));
        assert_eq!(RoomKey::parse("no spaces"), Err(RoomKeyError::Charset));
        assert_eq!(RoomKey::parse("emoji👍"), Err(RoomKeyError::Charset));
    }

    #[test]
    fn test_serde_transparent() {
        let key = RoomKey::parse("general").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"general\"");
    }
}
