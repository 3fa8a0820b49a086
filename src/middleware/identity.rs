use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::User;
use crate::error::AppError;

/// Header set by the auth gateway once it has verified the caller's token.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The signed-in caller, resolved from [`USER_ID_HEADER`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Authentication("Missing caller identity".into()))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(|| AppError::Authentication("Malformed caller identity".into()))?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("Unknown caller".into()))?;

        Ok(CurrentUser(user))
    }
}

/// A caller with the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Authorization("Admin access required".into()));
        }
        Ok(AdminUser(user))
    }
}
