//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use openchat_auth::SessionService;
use openchat_core::config::AppConfig;
use openchat_database::repositories::channel::ChannelRepository;
use openchat_database::repositories::user::UserRepository;
use openchat_realtime::ConnectionManager;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// User repository.
    pub users: Arc<UserRepository>,
    /// Channel repository.
    pub channels: Arc<ChannelRepository>,
    /// Session issuance and resolution.
    pub sessions: Arc<SessionService>,
    /// Entry point into the realtime room engine.
    pub manager: Arc<ConnectionManager>,
}
