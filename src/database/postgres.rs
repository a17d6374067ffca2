use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{map_unique_violation, DatabaseError};
use crate::database::models::{Car, CarPatch, User};
use crate::database::repository::{car_not_found, ensure_owner, CarRepository, UpdatedCar, UserRepository};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

const CAR_COLUMNS: &str = "id, make, model, year, price, mileage, description, color, \
    fuel_type, transmission, image, seller_id, created_at, is_sold";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

pub struct PgCarRepository {
    pool: PgPool,
}

impl PgCarRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CarRepository for PgCarRepository {
    async fn insert(&self, car: &Car) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO cars ({CAR_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(car.id)
        .bind(&car.make)
        .bind(&car.model)
        .bind(car.year)
        .bind(car.price)
        .bind(car.mileage)
        .bind(&car.description)
        .bind(&car.color)
        .bind(&car.fuel_type)
        .bind(&car.transmission)
        .bind(&car.image)
        .bind(car.seller_id)
        .bind(car.created_at)
        .bind(car.is_sold)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Car>, DatabaseError> {
        let car = sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(car)
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Car>, DatabaseError> {
        let cars = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at, id OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(cars)
    }

    async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Car>, DatabaseError> {
        let cars = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE seller_id = $1 ORDER BY created_at, id"
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(cars)
    }

    async fn search(&self, query: &str) -> Result<Vec<Car>, DatabaseError> {
        let pattern = like_pattern(query);
        let cars = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars
             WHERE make ILIKE $1 OR model ILIKE $1 OR color ILIKE $1 OR description ILIKE $1
             ORDER BY created_at, id"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(cars)
    }

    async fn update_owned(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &CarPatch,
    ) -> Result<UpdatedCar, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let previous = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| car_not_found(id))?;

        // Dropping `tx` on the error path rolls back
        ensure_owner(&previous, acting_user)?;

        let mut current = previous.clone();
        patch.apply(&mut current);

        sqlx::query(
            "UPDATE cars SET make = $2, model = $3, year = $4, price = $5, mileage = $6,
                description = $7, color = $8, fuel_type = $9, transmission = $10,
                image = $11, is_sold = $12
             WHERE id = $1",
        )
        .bind(id)
        .bind(&current.make)
        .bind(&current.model)
        .bind(current.year)
        .bind(current.price)
        .bind(current.mileage)
        .bind(&current.description)
        .bind(&current.color)
        .bind(&current.fuel_type)
        .bind(&current.transmission)
        .bind(&current.image)
        .bind(current.is_sold)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(UpdatedCar { previous, current })
    }

    async fn delete_owned(&self, id: Uuid, acting_user: Uuid) -> Result<Car, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let car = sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| car_not_found(id))?;

        ensure_owner(&car, acting_user)?;

        sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(car)
    }
}

/// `%query%` with LIKE metacharacters escaped so they match literally
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("Toy"), "%Toy%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }
}
