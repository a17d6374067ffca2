// handlers/public/auth/register.rs - POST /register handler

use axum::extract::State;

use crate::database::models::{Registration, User};
use crate::error::ApiError;
use crate::handlers::extract::Json;
use crate::state::AppState;

/**
 * POST /register - Create a new user account
 *
 * Expected Input:
 * ```json
 * {
 *   "username": "alice",                // Required: unique
 *   "email": "alice@example.com",       // Required: unique
 *   "password": "password123",          // Required
 *   "confirmed_password": "password123" // Required: must equal password
 * }
 * ```
 *
 * Expected Output (Success): the stored user, without any password data
 * ```json
 * {
 *   "id": "uuid",
 *   "username": "alice",
 *   "email": "alice@example.com",
 *   "created_at": "2024-01-01T00:00:00Z"
 * }
 * ```
 *
 * 400 when a field is missing, the confirmation does not match, or the
 * email/username is taken.
 */
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Registration>,
) -> Result<Json<User>, ApiError> {
    let user = state.credentials.register(&payload).await?;
    Ok(Json(user))
}
