use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Caller holding the configured admin token, extracted from the
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to restrict an endpoint to administrators.
/// When no token is configured every request is rejected with `PermissionDenied`.
pub struct AdminUser;

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .auth
            .admin_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AppError::PermissionDenied)?;

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            return Err(AppError::TokenInvalid);
        }

        Ok(AdminUser)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
