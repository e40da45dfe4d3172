//! User handlers — lookup, search, self-service profile, platform links.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use openchat_core::error::AppError;
use openchat_entity::user::UpdateUser;

use crate::dto::request::UpdateProfileRequest;
use crate::dto::response::{ApiResponse, LinkResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}

/// GET /api/users/search/{term}
pub async fn search_users(
    State(state): State<AppState>,
    Path(term): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = state.users.search(&term).await?;
    let results = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(ApiResponse::ok(results)))
}

/// PUT /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let updated = state
        .users
        .update(UpdateUser {
            id: user.id,
            name: req.name,
            color: req.color,
            status: None,
        })
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ApiResponse::ok(UserResponse::from(updated))))
}

/// GET /api/users/me/links
pub async fn my_links(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<LinkResponse>>>, ApiError> {
    let links = state.users.links_for_user(user.id).await?;
    let results = links.into_iter().map(LinkResponse::from).collect();

    Ok(Json(ApiResponse::ok(results)))
}
