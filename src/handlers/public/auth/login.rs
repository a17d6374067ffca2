// handlers/public/auth/login.rs - POST /login and POST /access-token handler

use axum::extract::State;
use serde::Deserialize;

use crate::auth::TokenPair;
use crate::error::ApiError;
use crate::handlers::extract::Json;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/**
 * POST /login - Exchange email and password for an access/refresh pair
 *
 * Also mounted at POST /access-token.
 *
 * Expected Input:
 * ```json
 * {
 *   "email": "alice@example.com",   // Required
 *   "password": "password123"       // Required
 * }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "access_token": "eyJ...",
 *   "refresh_token": "eyJ...",
 *   "token_type": "bearer"
 * }
 * ```
 *
 * 401 "Incorrect Email or password" for an unknown email or a wrong password.
 */
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = state
        .credentials
        .authenticate(&payload.email, &payload.password)
        .await?;

    let pair = state.tokens.issue_pair(&user.email)?;
    tracing::info!("User {} logged in", user.id);
    Ok(Json(pair))
}
