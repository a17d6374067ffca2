// handlers/protected/auth/whoami.rs - GET /me handler

use crate::database::models::User;
use crate::handlers::extract::Json;
use crate::middleware::AuthUser;

/// GET /me - The profile of the user the access token was issued to
pub async fn whoami(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
