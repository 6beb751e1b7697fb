//! Bearer-token extractor for authenticated endpoints.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::User;
use crate::error::GatewayError;

/// The user behind the request's `Authorization: Bearer <token>` header.
///
/// Handlers that take this extractor reject unauthenticated requests with
/// 401 before their body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Authenticated user, loaded at extraction time.
    pub user: User,
    /// The raw bearer token, kept for logout.
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| GatewayError::Unauthorized("missing token".to_string()))?;
        let user = state.auth.authenticate(token).await?;
        Ok(Self {
            user,
            token: token.to_string(),
        })
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
