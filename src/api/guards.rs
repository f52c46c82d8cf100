use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{request::Parts, HeaderMap};

use crate::api::errors::ApiError;
use crate::core::state::AppState;

pub(crate) const USER_ID_HEADER: &str = "x-user-id";
pub(crate) const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Caller identity asserted by the upstream gateway.
pub(crate) struct CurrentUser(pub(crate) String);

/// Operator access to maintenance routes.
pub(crate) struct AdminAccess;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_value(&parts.headers, USER_ID_HEADER)
            .ok_or(ApiError::Unauthorized("Missing user identity"))?;

        Ok(CurrentUser(user_id.to_string()))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let Some(expected) = app_state.settings().admin().token.as_deref() else {
            return Err(ApiError::Forbidden("Admin access is disabled"));
        };

        match header_value(&parts.headers, ADMIN_TOKEN_HEADER) {
            Some(token) if token == expected => Ok(AdminAccess),
            _ => Err(ApiError::Unauthorized("Invalid admin token")),
        }
    }
}
