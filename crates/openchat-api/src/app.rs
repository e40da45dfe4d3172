//! Application builder — wires router + middleware + state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::PgPool;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use openchat_auth::SessionService;
use openchat_core::config::AppConfig;
use openchat_core::config::server::CorsConfig;
use openchat_core::error::AppError;
use openchat_database::repositories::channel::ChannelRepository;
use openchat_database::repositories::session_token::SessionTokenRepository;
use openchat_database::repositories::user::UserRepository;
use openchat_realtime::{ConnectionManager, EngineMetrics, RoomRegistry, ServiceBus, SessionResolver};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// How often expired session tokens are swept from the database.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

/// Runs the OpenChat server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    info!("Starting OpenChat server...");

    // ── Repositories ─────────────────────────────────────────────
    let users = Arc::new(UserRepository::new(db_pool.clone()));
    let channels = Arc::new(ChannelRepository::new(db_pool.clone()));
    let session_tokens = Arc::new(SessionTokenRepository::new(db_pool.clone()));

    // ── Sessions ─────────────────────────────────────────────────
    let sessions = Arc::new(SessionService::new(
        Arc::clone(&session_tokens),
        Arc::clone(&users),
        config.session.clone(),
    ));

    // ── Realtime engine ──────────────────────────────────────────
    let registry = Arc::new(RoomRegistry::new());
    let metrics = Arc::new(EngineMetrics::new());
    let bus = if config.realtime.bus.enabled {
        Some(Arc::new(ServiceBus::new(&config.realtime.bus)))
    } else {
        None
    };
    let manager = Arc::new(ConnectionManager::new(
        config.realtime.clone(),
        Arc::clone(&registry),
        Arc::clone(&sessions) as Arc<dyn SessionResolver>,
        bus,
        Arc::clone(&metrics),
    ));

    // ── Shutdown channel & session sweeper ───────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let purge_sessions = Arc::clone(&sessions);
    let mut purge_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
        tick.tick().await;
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match purge_sessions.purge_expired().await {
                        Ok(purged) if purged > 0 => {
                            info!(purged, "Swept expired session tokens");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Session sweep failed"),
                    }
                }
                _ = purge_shutdown.changed() => break,
            }
        }
    });

    // ── Build and start HTTP server ──────────────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        db_pool: db_pool.clone(),
        users,
        channels,
        sessions,
        manager,
    };

    let app = build_app(app_state, &config.server.cors);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("OpenChat server listening on {addr}");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        // Without a signal handler there is nothing to wait for; park so
        // the server keeps running instead of shutting down immediately.
        std::future::pending::<()>().await;
    }
}
