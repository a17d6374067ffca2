use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::auth::TokenKind;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The user behind a valid access token.
///
/// Handlers that take this extractor reject the request with 401 before
/// running when the bearer token is missing, invalid, expired, of the wrong
/// kind, or names a user that no longer exists.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_jwt_from_headers(&parts.headers).map_err(|msg| {
            tracing::debug!("Rejected request to {}: {}", parts.uri.path(), msg);
            ApiError::unauthorized(msg)
        })?;

        let email = state.tokens.validate(&token, TokenKind::Access)?;

        match state.credentials.find_by_email(&email).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                tracing::warn!("Access token for unknown user '{}'", email);
                Err(ApiError::unauthorized("User not found"))
            }
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Not authenticated")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    let (scheme, token) = auth_str
        .split_once(' ')
        .ok_or("Authorization header must use Bearer token format")?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("Authorization header must use Bearer token format");
    }

    let token = token.trim();
    if token.is_empty() {
        return Err("Empty JWT token");
    }
    Ok(token.to_string())
}
