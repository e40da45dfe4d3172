//! Channel entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A chat channel. The channel's slug doubles as the room key its live
/// room is addressed by.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    /// Unique channel identifier.
    pub id: Uuid,
    /// Unique lowercase slug, used as the room key.
    pub slug: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Human-readable channel name.
    pub name: String,
    /// Custom domain the channel is served under.
    pub domain: Option<String>,
    /// Icon URL.
    pub icon: Option<String>,
    /// Twitch embed/channel id, if the channel mirrors a Twitch stream.
    pub twitch_id: Option<String>,
    /// YouTube embed/channel id.
    pub youtube_id: Option<String>,
    /// Kick embed/channel id.
    pub kick_id: Option<String>,
    /// Rumble embed/channel id.
    pub rumble_id: Option<String>,
    /// When the channel was created.
    pub created_at: DateTime<Utc>,
}

impl Channel {
    /// The domain this channel is reachable under, falling back to the
    /// platform default of `<slug>.openchat.dev`.
    pub fn effective_domain(&self) -> String {
        match &self.domain {
            Some(domain) if !domain.is_empty() => domain.clone(),
            _ => format!("{}.openchat.dev", self.slug),
        }
    }

    /// The icon URL, falling back to the platform default.
    pub fn effective_icon(&self) -> &str {
        match &self.icon {
            Some(icon) if !icon.is_empty() => icon,
            _ => "/channel-logo.svg",
        }
    }
}

/// Data required to create a new channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannel {
    /// Desired slug; normalized to lowercase before insert.
    pub slug: String,
    /// Channel display name.
    pub name: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Custom domain (optional).
    pub domain: Option<String>,
    /// Icon URL (optional).
    pub icon: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(domain: Option<&str>) -> Channel {
        Channel {
            id: Uuid::new_v4(),
            slug: "general".to_string(),
            owner_id: Uuid::new_v4(),
            name: "General".to_string(),
            domain: domain.map(String::from),
            icon: None,
            twitch_id: None,
            youtube_id: None,
            kick_id: None,
            rumble_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_domain_fallback() {
        assert_eq!(channel(None).effective_domain(), "general.openchat.dev");
        assert_eq!(channel(Some("")).effective_domain(), "general.openchat.dev");
        assert_eq!(channel(Some("chat.example.com")).effective_domain(), "chat.example.com");
    }
}
