// handlers/public/cars.rs - Anonymous read access to listings

use axum::extract::State;
use serde::Deserialize;

use crate::database::models::Car;
use crate::error::ApiError;
use crate::handlers::extract::{Json, Path, Query};
use crate::state::AppState;

/// Literal segment of `POST /cars/upload`; never a listing id
const UPLOAD_SEGMENT: &str = "upload";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/**
 * GET /cars?skip=&limit= - Listings in creation order
 *
 * Defaults to `skip=0&limit=100`. Larger limits are clamped to the
 * configured maximum, negative values are a 400.
 *
 * Expected Output (Success):
 * ```json
 * [
 *   {
 *     "id": "uuid", "make": "Toyota", "model": "Camry", "year": 2020,
 *     "price": 25000.0, "mileage": 15000, "description": null,
 *     "color": "Silver", "fuel_type": "Gasoline", "transmission": "Automatic",
 *     "image": "/uploads/<name>", "seller_id": "uuid",
 *     "created_at": "2024-01-01T00:00:00Z", "is_sold": false
 *   }
 * ]
 * ```
 */
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Car>>, ApiError> {
    let cars = state.listings.list(query.skip, query.limit).await?;
    Ok(Json(cars))
}

/// GET /cars/:id - A single listing; 404 for unknown or malformed ids
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Car>, ApiError> {
    Ok(Json(state.listings.get(&id).await?))
}

/// GET /cars/upload - Shadowed by the upload route, so it answers like an unknown id
pub async fn get_upload(State(state): State<AppState>) -> Result<Json<Car>, ApiError> {
    Ok(Json(state.listings.get(UPLOAD_SEGMENT).await?))
}

/// GET /cars/search/:query - Case-insensitive match on make, model, color or description
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Vec<Car>>, ApiError> {
    Ok(Json(state.listings.search(&query).await?))
}
