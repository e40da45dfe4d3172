//! Route definitions for the OpenChat HTTP API.
//!
//! REST routes are organized by domain and mounted under `/api`; the
//! WebSocket room endpoint lives at the root. The router receives
//! `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(channel_routes())
        .merge(room_routes())
        .merge(health_routes());

    let ws_routes = Router::new().route("/rooms/{room_key}/live", get(handlers::ws::room_live));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Auth endpoints: register, login, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// User lookup and self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", put(handlers::user::update_profile))
        .route("/users/me/links", get(handlers::user::my_links))
        .route("/users/search/{term}", get(handlers::user::search_users))
        .route("/users/{id}", get(handlers::user::get_user))
}

/// Channel CRUD and role grants
fn channel_routes() -> Router<AppState> {
    Router::new()
        .route("/channels", get(handlers::channel::my_channels))
        .route("/channels", post(handlers::channel::create_channel))
        .route(
            "/channels/search/{term}",
            get(handlers::channel::search_channels),
        )
        .route("/channels/{slug}", get(handlers::channel::get_channel))
        .route("/channels/{slug}/roles", post(handlers::channel::grant_role))
        .route(
            "/channels/{slug}/roles/{user_id}",
            put(handlers::channel::set_role_enabled),
        )
}

/// Live room directory
fn room_routes() -> Router<AppState> {
    Router::new().route("/rooms", get(handlers::room::list_rooms))
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/metrics", get(handlers::health::health_metrics))
}
