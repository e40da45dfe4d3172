//! `CurrentUser` extractor — resolves the session cookie into a user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;

use openchat_core::error::AppError;
use openchat_entity::user::User;

use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated user available in handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Returns the inner user.
    pub fn user(&self) -> &User {
        &self.0
    }
}

impl std::ops::Deref for CurrentUser {
    type Target = User;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(state.sessions.cookie_name())
            .ok_or_else(|| AppError::unauthorized("Missing session cookie"))?;

        let user = state
            .sessions
            .resolve_user(cookie.value())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired session"))?;

        Ok(CurrentUser(user))
    }
}
