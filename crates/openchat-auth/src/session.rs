//! Session lifecycle — issue, resolve, revoke, purge.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use openchat_core::config::session::SessionConfig;
use openchat_core::result::AppResult;
use openchat_database::repositories::{ScopedRole, SessionTokenRepository, UserRepository};
use openchat_entity::session::{IssuedSession, SessionToken};
use openchat_entity::user::User;
use openchat_realtime::connection::manager::SessionResolver;
use openchat_realtime::room::identity::{IdentityProfile, RoleGrant};
use openchat_realtime::room::key::RoomKey;

use crate::token;

/// Issues and resolves cookie sessions.
///
/// Doubles as the realtime engine's [`SessionResolver`]: the WebSocket
/// join path hands the raw cookie value here and gets back reconstructed
/// identity attributes with room-ready grant scopes.
#[derive(Debug, Clone)]
pub struct SessionService {
    /// Token persistence.
    tokens: Arc<SessionTokenRepository>,
    /// User and grant loading.
    users: Arc<UserRepository>,
    /// Session configuration.
    config: SessionConfig,
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(
        tokens: Arc<SessionTokenRepository>,
        users: Arc<UserRepository>,
        config: SessionConfig,
    ) -> Self {
        Self {
            tokens,
            users,
            config,
        }
    }

    /// Session cookie name from configuration.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies
    }

    /// Issue a fresh session for a user.
    ///
    /// The returned value carries the cleartext validator exactly once;
    /// only its salted hash is persisted.
    pub async fn issue(&self, user_id: Uuid) -> AppResult<IssuedSession> {
        let material = token::generate();
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.config.token_ttl_hours as i64);

        let row = SessionToken {
            user_id,
            selector: material.selector.clone(),
            hashed_validator: material.hashed_validator,
            salt_code: material.salt_code,
            expires_at,
            created_at: now,
        };
        self.tokens.insert(&row).await?;

        info!(user_id = %user_id, selector = %material.selector, "Session issued");

        Ok(IssuedSession {
            user_id,
            selector: material.selector,
            validator: material.validator,
            expires_at,
        })
    }

    /// Resolve a cookie value to the user it authenticates, touching
    /// their last-seen stamp. Invalid, unknown and expired cookies all
    /// resolve to `None`; only infrastructure failures are errors.
    pub async fn resolve_user(&self, cookie_value: &str) -> AppResult<Option<User>> {
        let Some(row) = self.validate_cookie(cookie_value).await? else {
            return Ok(None);
        };

        let Some(user) = self.users.find_by_id(row.user_id).await? else {
            warn!(user_id = %row.user_id, "Session points at a missing user");
            return Ok(None);
        };

        if let Err(e) = self.users.touch_last_seen(user.id).await {
            warn!(user_id = %user.id, error = %e, "Failed to touch last seen");
        }

        Ok(Some(user))
    }

    /// Revoke one session by its cookie value; returns whether it existed.
    pub async fn revoke(&self, cookie_value: &str) -> AppResult<bool> {
        let Some((selector, _)) = split_cookie(cookie_value) else {
            return Ok(false);
        };
        let removed = self.tokens.delete_by_selector(selector).await?;
        if removed {
            info!(selector = %selector, "Session revoked");
        }
        Ok(removed)
    }

    /// Revoke every session a user holds; returns the number removed.
    pub async fn revoke_all(&self, user_id: Uuid) -> AppResult<u64> {
        let removed = self.tokens.delete_for_user(user_id).await?;
        info!(user_id = %user_id, count = removed, "All user sessions revoked");
        Ok(removed)
    }

    /// Remove expired token rows; returns the number removed.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.tokens.delete_expired().await?;
        if removed > 0 {
            info!(count = removed, "Expired sessions purged");
        }
        Ok(removed)
    }

    /// Look up the token row and verify the validator. Expired rows are
    /// deleted on the way out.
    async fn validate_cookie(&self, cookie_value: &str) -> AppResult<Option<SessionToken>> {
        let Some((selector, validator)) = split_cookie(cookie_value) else {
            debug!("Malformed session cookie");
            return Ok(None);
        };

        let Some(row) = self.tokens.find_by_selector(selector).await? else {
            return Ok(None);
        };

        if !token::verify_validator(validator, &row.salt_code, &row.hashed_validator) {
            warn!(selector = %selector, "Session validator mismatch");
            return Ok(None);
        }

        if row.is_expired() {
            let _ = self.tokens.delete_by_selector(selector).await;
            debug!(selector = %selector, "Session expired");
            return Ok(None);
        }

        Ok(Some(row))
    }
}

#[async_trait]
impl SessionResolver for SessionService {
    async fn resolve(&self, session_ref: &str) -> AppResult<Option<IdentityProfile>> {
        let Some(user) = self.resolve_user(session_ref).await? else {
            return Ok(None);
        };

        let grants = self.users.grants_for_user(user.id).await?;
        Ok(Some(IdentityProfile {
            id: user.id,
            name: user.name,
            status: user.status,
            color: user.color,
            grants: room_grants(grants),
        }))
    }
}

/// Split a cookie value into `(selector, validator)`.
fn split_cookie(cookie_value: &str) -> Option<(&str, &str)> {
    let (selector, validator) = cookie_value.split_once('.')?;
    if selector.is_empty() || validator.is_empty() {
        return None;
    }
    Some((selector, validator))
}

/// Map persisted grants to room-scoped grants. Grants scoped to a channel
/// whose slug is not a usable room key can never match a room and are
/// dropped.
fn room_grants(grants: Vec<ScopedRole>) -> Vec<RoleGrant> {
    grants
        .into_iter()
        .filter_map(|g| {
            let scope = match g.channel_slug {
                Some(slug) => match RoomKey::parse(&slug) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        debug!(slug = %slug, error = %e, "Dropping grant with unusable scope");
                        return None;
                    }
                },
                None => None,
            };
            Some(RoleGrant {
                rank: g.role.rank,
                scope,
                enabled: g.role.enabled,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use openchat_entity::user::{ChannelRole, RoleKind};

    #[test]
    fn test_split_cookie() {
        assert_eq!(split_cookie("abc.def"), Some(("abc", "def")));
        assert_eq!(split_cookie("abc.def.ghi"), Some(("abc", "def.ghi")));
        assert_eq!(split_cookie("nodot"), None);
        assert_eq!(split_cookie(".novalue"), None);
        assert_eq!(split_cookie("noselector."), None);
    }

    fn scoped(rank: i16, enabled: bool, slug: Option<&str>) -> ScopedRole {
        ScopedRole {
            role: ChannelRole {
                user_id: Uuid::new_v4(),
                channel_id: slug.map(|_| Uuid::new_v4()),
                kind: RoleKind::Mod,
                rank,
                enabled,
                granted_at: Utc::now(),
            },
            channel_slug: slug.map(str::to_string),
        }
    }

    #[test]
    fn test_room_grants_carry_scope_and_enabled() {
        let grants = room_grants(vec![
            scoped(6, true, None),
            scoped(2, false, Some("general")),
        ]);

        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].rank, 6);
        assert_eq!(grants[0].scope, None);
        assert!(grants[0].enabled);
        assert_eq!(grants[1].scope, Some(RoomKey::parse("general").unwrap()));
        assert!(!grants[1].enabled);
    }

    #[test]
    fn test_unusable_scope_is_dropped() {
        let grants = room_grants(vec![scoped(3, true, Some("x")), scoped(4, true, None)]);
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].rank, 4);
    }
}
