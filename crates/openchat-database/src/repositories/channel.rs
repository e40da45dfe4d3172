//! Channel repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use openchat_core::error::{AppError, ErrorKind};
use openchat_core::result::AppResult;
use openchat_entity::channel::{Channel, CreateChannel};
use openchat_entity::user::RoleKind;

/// Repository for channel CRUD and lookup operations.
#[derive(Debug, Clone)]
pub struct ChannelRepository {
    pool: PgPool,
}

impl ChannelRepository {
    /// Create a new channel repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a channel by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Channel>> {
        sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find channel by id", e)
            })
    }

    /// Find a channel by slug (case-insensitive).
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Channel>> {
        sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE LOWER(slug) = LOWER($1)")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find channel by slug", e)
            })
    }

    /// List all channels owned by a user.
    pub async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Channel>> {
        sqlx::query_as::<_, Channel>(
            "SELECT * FROM channels WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list channels by owner", e)
        })
    }

    /// Search channels by slug, name, or domain.
    pub async fn search(&self, term: &str) -> AppResult<Vec<Channel>> {
        let pattern = format!("%{term}%");
        sqlx::query_as::<_, Channel>(
            "SELECT * FROM channels
             WHERE slug ILIKE $1 OR name ILIKE $1 OR domain ILIKE $1
             ORDER BY slug
             LIMIT 50",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search channels", e))
    }

    /// Insert a new channel and grant its owner the owner role, atomically.
    pub async fn create(&self, data: CreateChannel) -> AppResult<Channel> {
        let slug = data.slug.to_lowercase();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let channel = sqlx::query_as::<_, Channel>(
            "INSERT INTO channels (id, slug, owner_id, name, domain, icon)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&slug)
        .bind(data.owner_id)
        .bind(&data.name)
        .bind(&data.domain)
        .bind(&data.icon)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("Channel slug '{slug}' is already taken"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create channel", e),
        })?;

        sqlx::query(
            "INSERT INTO user_channel_roles (user_id, channel_id, kind, rank, enabled)
             VALUES ($1, $2, $3, $4, true)",
        )
        .bind(data.owner_id)
        .bind(channel.id)
        .bind(RoleKind::Owner)
        .bind(RoleKind::Owner.default_rank())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to grant owner role", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit channel creation", e)
        })?;

        Ok(channel)
    }
}
