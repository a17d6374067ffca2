// handlers/protected/cars/mine.rs - GET /my-cars

use axum::extract::State;

use crate::database::models::Car;
use crate::error::ApiError;
use crate::handlers::extract::Json;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /my-cars - Every listing the caller is selling, oldest first
pub async fn mine(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Vec<Car>>, ApiError> {
    Ok(Json(state.listings.list_by_seller(user.id).await?))
}
