use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Car, CarPatch, User};

/// Persistence for user identities
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DatabaseError::Duplicate` when email or username is taken
    async fn insert(&self, user: &User) -> Result<(), DatabaseError>;

    /// Exact, case-sensitive match on the stored email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
}

/// Persistence for car listings.
///
/// `update_owned` and `delete_owned` perform the ownership check and the
/// write as one atomic unit.
#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn insert(&self, car: &Car) -> Result<(), DatabaseError>;

    async fn find(&self, id: Uuid) -> Result<Option<Car>, DatabaseError>;

    /// Creation order, offset pagination
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Car>, DatabaseError>;

    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Car>, DatabaseError>;

    /// Case-insensitive substring match on make, model, color or description
    async fn search(&self, query: &str) -> Result<Vec<Car>, DatabaseError>;

    async fn update_owned(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &CarPatch,
    ) -> Result<UpdatedCar, DatabaseError>;

    /// Returns the removed record so callers can clean up its image
    async fn delete_owned(&self, id: Uuid, acting_user: Uuid) -> Result<Car, DatabaseError>;
}

/// Listing state on either side of a committed update
#[derive(Debug, Clone)]
pub struct UpdatedCar {
    pub previous: Car,
    pub current: Car,
}

pub(crate) fn ensure_owner(car: &Car, acting_user: Uuid) -> Result<(), DatabaseError> {
    if car.seller_id == acting_user {
        Ok(())
    } else {
        Err(DatabaseError::NotOwner)
    }
}

pub(crate) fn car_not_found(id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("car {}", id))
}
