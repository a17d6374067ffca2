// handlers/protected/cars/create.rs - POST /cars and POST /cars/upload

use axum::extract::State;

use crate::database::models::{Car, NewCar};
use crate::error::ApiError;
use crate::handlers::extract::Json;
use crate::handlers::multipart::CarForm;
use crate::middleware::AuthUser;
use crate::state::AppState;

/**
 * POST /cars - Create a listing owned by the caller
 *
 * Expected Input:
 * ```json
 * {
 *   "make": "Toyota",                 // Required
 *   "model": "Camry",                 // Required
 *   "year": 2020,                     // Required
 *   "price": 25000,                   // Required
 *   "mileage": 15000,                 // Required
 *   "description": "optional",
 *   "color": "Silver",                // Required
 *   "fuel_type": "Gasoline",          // Required
 *   "transmission": "Automatic",      // Required
 *   "image": "/uploads/<name>"        // Required: URL from POST /upload or elsewhere
 * }
 * ```
 *
 * Expected Output (Success): the stored listing, with `id`, `seller_id`,
 * `created_at` and `is_sold: false` filled in.
 */
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<NewCar>,
) -> Result<Json<Car>, ApiError> {
    let car = state.listings.create(payload, user.id).await?;
    Ok(Json(car))
}

/**
 * POST /cars/upload - Create a listing and its image in one multipart request
 *
 * Expected Input (multipart/form-data):
 * - text parts mirroring the JSON body of POST /cars, without `image`
 * - `file`: required JPEG, PNG or WebP image
 *
 * The image is stored before the listing is inserted and removed again if
 * the insert fails.
 */
pub async fn create_with_upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut form: CarForm,
) -> Result<Json<Car>, ApiError> {
    let new_car = form.new_car()?;
    let upload = form.require_file()?;

    let car = state
        .listings
        .create_with_image(new_car, user.id, &upload)
        .await?;
    Ok(Json(car))
}
