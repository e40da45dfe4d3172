//! Room directory handlers.

use axum::Json;
use axum::extract::State;

use openchat_realtime::RoomSummary;

use crate::dto::response::ApiResponse;
use crate::state::AppState;

/// GET /api/rooms — every open room with its live member count.
pub async fn list_rooms(State(state): State<AppState>) -> Json<ApiResponse<Vec<RoomSummary>>> {
    let rooms = state.manager.registry().list_rooms().await;
    Json(ApiResponse::ok(rooms))
}
