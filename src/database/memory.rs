use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Car, CarPatch, User};
use crate::database::repository::{car_not_found, ensure_owner, CarRepository, UpdatedCar, UserRepository};

/// Process-local user store used for development and tests
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(DatabaseError::Duplicate("email"));
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(DatabaseError::Duplicate("username"));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }
}

/// Process-local listing store; vector order is creation order
#[derive(Default)]
pub struct MemoryCarRepository {
    cars: RwLock<Vec<Car>>,
}

impl MemoryCarRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CarRepository for MemoryCarRepository {
    async fn insert(&self, car: &Car) -> Result<(), DatabaseError> {
        self.cars.write().await.push(car.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Car>, DatabaseError> {
        let cars = self.cars.read().await;
        Ok(cars.iter().find(|c| c.id == id).cloned())
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Car>, DatabaseError> {
        let skip = usize::try_from(skip).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        let cars = self.cars.read().await;
        Ok(cars.iter().skip(skip).take(limit).cloned().collect())
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Car>, DatabaseError> {
        let cars = self.cars.read().await;
        Ok(cars.iter().filter(|c| c.seller_id == seller_id).cloned().collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Car>, DatabaseError> {
        let needle = query.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&needle);

        let cars = self.cars.read().await;
        Ok(cars
            .iter()
            .filter(|c| {
                hit(&c.make)
                    || hit(&c.model)
                    || hit(&c.color)
                    || c.description.as_deref().is_some_and(|d| hit(d))
            })
            .cloned()
            .collect())
    }

    async fn update_owned(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &CarPatch,
    ) -> Result<UpdatedCar, DatabaseError> {
        let mut cars = self.cars.write().await;
        let car = cars.iter_mut().find(|c| c.id == id).ok_or_else(|| car_not_found(id))?;
        ensure_owner(car, acting_user)?;

        let previous = car.clone();
        patch.apply(car);
        Ok(UpdatedCar {
            previous,
            current: car.clone(),
        })
    }

    async fn delete_owned(&self, id: Uuid, acting_user: Uuid) -> Result<Car, DatabaseError> {
        let mut cars = self.cars.write().await;
        let index = cars.iter().position(|c| c.id == id).ok_or_else(|| car_not_found(id))?;
        ensure_owner(&cars[index], acting_user)?;
        Ok(cars.remove(index))
    }
}
