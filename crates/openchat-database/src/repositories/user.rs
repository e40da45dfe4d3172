//! User repository implementation.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use openchat_core::error::{AppError, ErrorKind};
use openchat_core::result::AppResult;
use openchat_entity::user::model::{CreateUser, UpdateUser};
use openchat_entity::user::{ChannelRole, PlatformLink, RoleKind, User, UserStatus};

/// A role grant joined with the slug of the channel it is scoped to.
///
/// The slug is what room keys are compared against, so the resolver can
/// hand the realtime core ready-to-match scopes.
#[derive(Debug, Clone, FromRow)]
pub struct ScopedRole {
    /// The underlying grant row.
    #[sqlx(flatten)]
    pub role: ChannelRole,
    /// Slug of the scoping channel (`None` for global grants).
    pub channel_slug: Option<String>,
}

/// Repository for user CRUD, grants, and platform links.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    /// Find a user by display name (case-insensitive).
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by name", e)
            })
    }

    /// Search users by name.
    pub async fn search(&self, term: &str) -> AppResult<Vec<User>> {
        let pattern = format!("%{term}%");
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE name ILIKE $1 ORDER BY name LIMIT 50",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search users", e))
    }

    /// Insert a new user and return the stored row.
    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        let color = data.color.unwrap_or_else(|| "ffffff".to_string());

        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, status, color) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(UserStatus::Active)
        .bind(&color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("User name '{}' is already taken", data.name))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    /// Update a user's profile fields; absent fields are left unchanged.
    pub async fn update(&self, data: UpdateUser) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = COALESCE($2, name),
                 color = COALESCE($3, color),
                 status = COALESCE($4, status)
             WHERE id = $1
             RETURNING *",
        )
        .bind(data.id)
        .bind(&data.name)
        .bind(&data.color)
        .bind(data.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("User name is already taken")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to update user", e),
        })
    }

    /// Stamp the user's last-seen time.
    pub async fn touch_last_seen(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_seen_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to touch last seen", e)
            })?;
        Ok(())
    }

    /// Load all role grants for a user, with scope slugs resolved.
    pub async fn grants_for_user(&self, user_id: Uuid) -> AppResult<Vec<ScopedRole>> {
        sqlx::query_as::<_, ScopedRole>(
            "SELECT r.user_id, r.channel_id, r.kind, r.rank, r.enabled, r.granted_at,
                    c.slug AS channel_slug
             FROM user_channel_roles r
             LEFT JOIN channels c ON c.id = r.channel_id
             WHERE r.user_id = $1
             ORDER BY r.granted_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load user grants", e))
    }

    /// Grant a role to a user, optionally scoped to a channel. A second
    /// grant for the same scope is refused as a conflict.
    pub async fn grant_role(
        &self,
        user_id: Uuid,
        channel_id: Option<Uuid>,
        kind: RoleKind,
        rank: i16,
    ) -> AppResult<ChannelRole> {
        sqlx::query_as::<_, ChannelRole>(
            "INSERT INTO user_channel_roles (user_id, channel_id, kind, rank, enabled)
             VALUES ($1, $2, $3, $4, true)
             RETURNING user_id, channel_id, kind, rank, enabled, granted_at",
        )
        .bind(user_id)
        .bind(channel_id)
        .bind(kind)
        .bind(rank)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("User already holds a grant for this scope")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to grant role", e),
        })
    }

    /// Enable or disable an existing grant.
    pub async fn set_grant_enabled(
        &self,
        user_id: Uuid,
        channel_id: Option<Uuid>,
        enabled: bool,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE user_channel_roles
             SET enabled = $3
             WHERE user_id = $1 AND channel_id IS NOT DISTINCT FROM $2",
        )
        .bind(user_id)
        .bind(channel_id)
        .bind(enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update grant", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Load all third-party platform links for a user.
    pub async fn links_for_user(&self, user_id: Uuid) -> AppResult<Vec<PlatformLink>> {
        sqlx::query_as::<_, PlatformLink>(
            "SELECT * FROM user_platform_links WHERE user_id = $1 ORDER BY platform",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load platform links", e)
        })
    }
}
