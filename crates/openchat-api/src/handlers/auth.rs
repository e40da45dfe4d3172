//! Auth handlers — register, login, logout, me.
//!
//! Identity proof (the OAuth dance with streaming platforms) lives in the
//! upstream gateway; these endpoints manage the account rows and the
//! session cookies that the realtime engine later resolves.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use openchat_core::error::AppError;
use openchat_entity::session::IssuedSession;
use openchat_entity::user::{CreateUser, User};

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, MessageResponse, SessionResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// POST /api/auth/register — create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let user = state
        .users
        .create(CreateUser {
            name: req.name,
            color: req.color,
        })
        .await?;

    let session = state.sessions.issue(user.id).await?;
    let jar = jar.add(session_cookie(&state, &session));

    Ok((jar, Json(ApiResponse::ok(session_response(user, &session)))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let user = state
        .users
        .find_by_name(&req.name)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unknown account"))?;

    if !user.can_join() {
        return Err(AppError::forbidden("Account is banned").into());
    }

    let session = state.sessions.issue(user.id).await?;
    let jar = jar.add(session_cookie(&state, &session));

    Ok((jar, Json(ApiResponse::ok(session_response(user, &session)))))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<MessageResponse>>), ApiError> {
    let cookie_name = state.sessions.cookie_name().to_string();

    if let Some(cookie) = jar.get(&cookie_name) {
        state.sessions.revoke(cookie.value()).await?;
    }

    let mut removal = Cookie::new(cookie_name, "");
    removal.set_path("/");
    let jar = jar.remove(removal);

    Ok((
        jar,
        Json(ApiResponse::ok(MessageResponse {
            message: "Logged out".to_string(),
        })),
    ))
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::ok(UserResponse::from(user.0)))
}

fn session_response(user: User, session: &IssuedSession) -> SessionResponse {
    SessionResponse {
        user: UserResponse::from(user),
        expires_at: session.expires_at,
    }
}

/// Builds the session cookie carried by every authenticated request.
///
/// No `Expires` attribute: the server side enforces token expiry, and the
/// response body tells the client when that happens.
fn session_cookie(state: &AppState, session: &IssuedSession) -> Cookie<'static> {
    let mut cookie = Cookie::new(
        state.sessions.cookie_name().to_string(),
        session.cookie_value(),
    );
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(state.sessions.secure_cookies());
    cookie
}
