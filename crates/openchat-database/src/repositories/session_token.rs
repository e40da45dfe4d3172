//! Session token repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use openchat_core::error::{AppError, ErrorKind};
use openchat_core::result::AppResult;
use openchat_entity::session::SessionToken;

/// Repository for session token rows.
#[derive(Debug, Clone)]
pub struct SessionTokenRepository {
    pool: PgPool,
}

impl SessionTokenRepository {
    /// Create a new session token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly issued token.
    pub async fn insert(&self, token: &SessionToken) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_session_tokens
                 (selector, user_id, hashed_validator, salt_code, expires_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&token.selector)
        .bind(token.user_id)
        .bind(&token.hashed_validator)
        .bind(&token.salt_code)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Session selector collision")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert session token", e),
        })?;
        Ok(())
    }

    /// Look up a token row by its selector.
    pub async fn find_by_selector(&self, selector: &str) -> AppResult<Option<SessionToken>> {
        sqlx::query_as::<_, SessionToken>(
            "SELECT * FROM user_session_tokens WHERE selector = $1",
        )
        .bind(selector)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find session token", e)
        })
    }

    /// Delete a token row; returns whether a row existed.
    pub async fn delete_by_selector(&self, selector: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM user_session_tokens WHERE selector = $1")
            .bind(selector)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete session token", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every token issued to a user; returns the number removed.
    pub async fn delete_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_session_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete user sessions", e)
            })?;
        Ok(result.rows_affected())
    }

    /// Delete all expired tokens; returns the number removed.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM user_session_tokens WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete expired tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
