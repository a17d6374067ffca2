// handlers/protected/upload.rs - Standalone image upload and removal

use axum::extract::State;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::extract::{Json, Path};
use crate::handlers::multipart::CarForm;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub url: String,
    pub message: String,
}

/**
 * POST /upload - Store a single image and return its public URL
 *
 * Expected Input (multipart/form-data): `file`, a JPEG, PNG or WebP image
 * of at most 5MB
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "filename": "<uuid>.png",
 *   "url": "/uploads/<uuid>.png",
 *   "message": "Image uploaded successfully"
 * }
 * ```
 *
 * The URL can then be used as the `image` of POST /cars or PUT /cars/:id.
 */
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut form: CarForm,
) -> Result<Json<UploadResponse>, ApiError> {
    let stored = state.images.store(&form.require_file()?).await?;

    tracing::debug!("User {} uploaded {}", user.id, stored.filename);
    Ok(Json(UploadResponse {
        filename: stored.filename,
        url: stored.url,
        message: "Image uploaded successfully".to_string(),
    }))
}

/// DELETE /upload/:filename - Remove a stored image; 404 when it does not exist
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(filename): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.images.remove(&filename).await?;

    tracing::debug!("User {} removed {}", user.id, filename);
    Ok(Json(json!({ "message": format!("Image {} deleted successfully", filename) })))
}
