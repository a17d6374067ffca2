// handlers/protected/cars/update.rs - PUT /cars/:id and PUT /cars/:id/upload

use axum::extract::State;

use crate::database::models::{Car, CarPatch};
use crate::error::ApiError;
use crate::handlers::extract::{Json, Path};
use crate::handlers::multipart::CarForm;
use crate::middleware::AuthUser;
use crate::state::AppState;

/**
 * PUT /cars/:id - Partial update; fields absent from the body keep their value
 *
 * Expected Input (every field optional):
 * ```json
 * { "price": 24000, "is_sold": true }
 * ```
 *
 * Expected Output (Success): the listing after the update
 *
 * 404 for an unknown listing, 403 when the caller is not the seller.
 */
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<CarPatch>,
) -> Result<Json<Car>, ApiError> {
    let car = state.listings.update(&id, user.id, patch).await?;
    Ok(Json(car))
}

/**
 * PUT /cars/:id/upload - Partial multipart update with an optional new image
 *
 * Expected Input (multipart/form-data): any listing text parts, `is_sold`,
 * and an optional `file`. Blank text parts are ignored.
 *
 * When a `file` part is present it replaces the listing's image: the new
 * file is written first, the listing then points at it, and only then is
 * the previous file deleted.
 */
pub async fn update_with_upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    form: CarForm,
) -> Result<Json<Car>, ApiError> {
    let patch = form.car_patch()?;

    let car = state
        .listings
        .update_with_image(&id, user.id, patch, form.file.as_ref())
        .await?;
    Ok(Json(car))
}
