// handlers/protected/cars/delete.rs - DELETE /cars/:id

use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::extract::{Json, Path};
use crate::middleware::AuthUser;
use crate::state::AppState;

/**
 * DELETE /cars/:id - Remove a listing owned by the caller
 *
 * Expected Output (Success):
 * ```json
 * { "message": "Car deleted successfully" }
 * ```
 *
 * The listing's uploaded image is deleted as well. A missing or
 * undeletable file is logged and does not fail the request.
 */
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.listings.delete(&id, user.id).await?;
    Ok(Json(json!({ "message": "Car deleted successfully" })))
}
