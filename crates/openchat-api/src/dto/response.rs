//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openchat_entity::channel::Channel;
use openchat_entity::user::{PlatformLink, User};
use openchat_realtime::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// User summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Status.
    pub status: String,
    /// Hex color hint.
    pub color: String,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last seen.
    pub last_seen_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            status: user.status.as_str().to_string(),
            color: user.color,
            created_at: user.created_at,
            last_seen_at: user.last_seen_at,
        }
    }
}

/// Register/login response: the signed-in user plus session expiry.
///
/// The session token itself travels in the `Set-Cookie` header, never in
/// the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The signed-in user.
    pub user: UserResponse,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

/// Channel summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelResponse {
    /// Channel ID.
    pub id: Uuid,
    /// URL slug, doubling as the live room key.
    pub slug: String,
    /// Owning user.
    pub owner_id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Custom domain, if any.
    pub domain: Option<String>,
    /// Icon URL, if any.
    pub icon: Option<String>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id,
            slug: channel.slug,
            owner_id: channel.owner_id,
            name: channel.name,
            domain: channel.domain,
            icon: channel.icon,
            created_at: channel.created_at,
        }
    }
}

/// Linked third-party identity for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    /// Platform name.
    pub platform: String,
    /// Platform-side account identifier.
    pub external_id: String,
    /// Platform-side display name, if known.
    pub external_name: Option<String>,
    /// When the link was established.
    pub linked_at: DateTime<Utc>,
}

impl From<PlatformLink> for LinkResponse {
    fn from(link: PlatformLink) -> Self {
        Self {
            platform: link.platform.as_str().to_string(),
            external_id: link.external_id,
            external_name: link.external_name,
            linked_at: link.linked_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health response with engine counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Open rooms.
    pub rooms: usize,
    /// Realtime engine counters.
    pub engine: MetricsSnapshot,
}
