//! Channel handlers — listing, search, creation, role grants.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use openchat_core::error::AppError;
use openchat_entity::channel::{Channel, CreateChannel};
use openchat_realtime::RoomKey;

use crate::dto::request::{CreateChannelRequest, GrantRoleRequest, SetRoleEnabledRequest};
use crate::dto::response::{ApiResponse, ChannelResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// GET /api/channels — channels owned by the current user.
pub async fn my_channels(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<ChannelResponse>>>, ApiError> {
    let channels = state.channels.find_by_owner(user.id).await?;
    let results = channels.into_iter().map(ChannelResponse::from).collect();

    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/channels/search/{term}
pub async fn search_channels(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<ApiResponse<Vec<ChannelResponse>>>, ApiError> {
    let channels = state.channels.search(&term).await?;
    let results = channels.into_iter().map(ChannelResponse::from).collect();

    Ok(Json(ApiResponse::ok(results)))
}

/// GET /api/channels/{slug}
pub async fn get_channel(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ChannelResponse>>, ApiError> {
    let channel = state
        .channels
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found("Channel not found"))?;

    Ok(Json(ApiResponse::ok(ChannelResponse::from(channel))))
}

/// POST /api/channels
pub async fn create_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateChannelRequest>,
) -> Result<Json<ApiResponse<ChannelResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // The slug doubles as the live room key, so it must parse as one.
    RoomKey::parse(&req.slug).map_err(|e| AppError::validation(format!("Invalid slug: {e}")))?;

    let channel = state
        .channels
        .create(CreateChannel {
            slug: req.slug,
            name: req.name,
            owner_id: user.id,
            domain: req.domain,
            icon: req.icon,
        })
        .await?;

    Ok(Json(ApiResponse::ok(ChannelResponse::from(channel))))
}

/// POST /api/channels/{slug}/roles — grant a role, owner only.
pub async fn grant_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Json(req): Json<GrantRoleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let channel = owned_channel(&state, &user, &slug).await?;

    state
        .users
        .grant_role(
            req.user_id,
            Some(channel.id),
            req.kind,
            req.kind.default_rank(),
        )
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Granted {} on {}", req.kind.as_str(), channel.slug),
    })))
}

/// PUT /api/channels/{slug}/roles/{user_id} — toggle a grant, owner only.
pub async fn set_role_enabled(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((slug, user_id)): Path<(String, Uuid)>,
    Json(req): Json<SetRoleEnabledRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let channel = owned_channel(&state, &user, &slug).await?;

    let changed = state
        .users
        .set_grant_enabled(user_id, Some(channel.id), req.enabled)
        .await?;
    if !changed {
        return Err(AppError::not_found("No grant for that user on this channel").into());
    }

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: if req.enabled {
            "Grant enabled".to_string()
        } else {
            "Grant disabled".to_string()
        },
    })))
}

/// Loads a channel and checks the caller owns it.
async fn owned_channel(
    state: &AppState,
    user: &CurrentUser,
    slug: &str,
) -> Result<Channel, ApiError> {
    let channel = state
        .channels
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::not_found("Channel not found"))?;

    if channel.owner_id != user.id {
        return Err(AppError::forbidden("Only the channel owner may manage roles").into());
    }

    Ok(channel)
}
