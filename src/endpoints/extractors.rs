use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::db::DbConn;
use crate::error::AppError;
use crate::models::prelude::*;
use crate::models::user;
use crate::services::host::CurrentUser;
use crate::state::AppState;

/// Header set by the authenticating proxy in front of the service
pub const AUTH_EMAIL_HEADER: &str = "X-Auth-Request-Email";

/// Current user, falling back to the guest identity
pub struct RequestUser(pub CurrentUser);

/// Current user; guests are rejected
pub struct AuthUser(pub CurrentUser);

impl FromRequestParts<AppState> for RequestUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, &state.db).await?;
        Ok(RequestUser(user.unwrap_or_else(CurrentUser::guest)))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_user(parts, &state.db).await? {
            Some(u) if !u.is_guest => Ok(AuthUser(u)),
            _ => Err(AppError::Unauthorized(
                "Authentication required".to_string(),
            )),
        }
    }
}

/// Look up the user named by the proxy header
async fn resolve_user(parts: &Parts, db: &DbConn) -> Result<Option<CurrentUser>, AppError> {
    let Some(email) = parts
        .headers
        .get(AUTH_EMAIL_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };

    tracing::debug!("Found proxy header with email: {}", email);

    let found = User::find()
        .filter(user::Column::Email.eq(email.to_lowercase()))
        .one(db)
        .await?;

    if found.is_none() {
        tracing::debug!("No user matches proxy email, treating request as guest");
    }

    Ok(found.map(CurrentUser::from))
}
