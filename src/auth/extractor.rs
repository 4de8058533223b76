use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::protocol::UserId;
use crate::server::AppState;

/// The authenticated caller, resolved from a bearer token.
///
/// Browsers cannot set headers on a WebSocket upgrade, so `?token=` is
/// accepted as a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| AppError::Auth("Missing authentication token".to_string()))?;

        let claims = state.jwt_validator.validate(&token).map_err(|e| {
            tracing::warn!(error = %e, "JWT validation failed");
            e
        })?;

        Ok(AuthUser(claims.user_id()?))
    }
}

/// Extract token from Authorization header or query parameter
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
}
