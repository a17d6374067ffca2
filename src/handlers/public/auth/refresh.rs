// handlers/public/auth/refresh.rs - POST /refresh-token handler

use axum::extract::State;
use serde::Deserialize;

use crate::auth::TokenPair;
use crate::error::ApiError;
use crate::handlers::extract::Json;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/**
 * POST /refresh-token - Trade a refresh token for a fresh token pair
 *
 * Expected Input:
 * ```json
 * { "refresh_token": "eyJ..." }
 * ```
 *
 * Expected Output (Success): same shape as POST /login
 *
 * Access tokens are rejected here with 401 "Invalid token type". The
 * presented refresh token remains usable until it expires.
 */
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state.tokens.refresh(&payload.refresh_token).await?;
    Ok(Json(pair))
}
