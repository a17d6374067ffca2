use std::sync::Arc;

use chrono::{Datelike, SubsecRound, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::database::models::{Car, CarPatch, NewCar};
use crate::database::{CarRepository, DatabaseError};
use crate::services::image_service::{AssetError, ImageStore, ImageUpload, StoredImage};

/// First model year accepted for a listing
pub const EARLIEST_MODEL_YEAR: i32 = 1886;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{0}")]
    Validation(String),

    #[error("Car not found")]
    NotFound,

    #[error("Not authorized to {0} this car")]
    Forbidden(&'static str),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for ListingError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => ListingError::NotFound,
            other => ListingError::Database(other),
        }
    }
}

/// Car listings and the lifecycle of their image assets
#[derive(Clone)]
pub struct ListingService {
    cars: Arc<dyn CarRepository>,
    images: ImageStore,
    default_limit: i64,
    max_limit: i64,
}

impl ListingService {
    pub fn new(cars: Arc<dyn CarRepository>, images: ImageStore, api: &ApiConfig) -> Self {
        Self {
            cars,
            images,
            default_limit: api.default_page_limit,
            max_limit: api.max_page_limit,
        }
    }

    pub async fn create(&self, new: NewCar, seller_id: Uuid) -> Result<Car, ListingError> {
        validate_new(&new)?;
        validate_text("image", &new.image)?;
        let car = Car::from_new(normalize(new), seller_id, Utc::now().trunc_subsecs(6));
        self.cars.insert(&car).await?;

        info!("Created car {} for seller {}", car.id, seller_id);
        Ok(car)
    }

    /// Store the image first, then insert the listing pointing at it.
    /// A failed insert takes the stored file with it.
    pub async fn create_with_image(
        &self,
        mut new: NewCar,
        seller_id: Uuid,
        upload: &ImageUpload,
    ) -> Result<Car, ListingError> {
        validate_new(&new)?;

        let stored = self.images.store(upload).await?;
        new.image = stored.url.clone();

        match self.create(new, seller_id).await {
            Ok(car) => Ok(car),
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<Car, ListingError> {
        let id = parse_id(id)?;
        self.cars.find(id).await?.ok_or(ListingError::NotFound)
    }

    pub async fn list(&self, skip: Option<i64>, limit: Option<i64>) -> Result<Vec<Car>, ListingError> {
        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(self.default_limit);
        if skip < 0 || limit < 0 {
            return Err(ListingError::Validation(
                "skip and limit must not be negative".to_string(),
            ));
        }

        let limit = limit.min(self.max_limit);
        debug!("Listing cars skip={} limit={}", skip, limit);
        Ok(self.cars.list(skip, limit).await?)
    }

    pub async fn list_by_seller(&self, seller_id: Uuid) -> Result<Vec<Car>, ListingError> {
        Ok(self.cars.list_by_seller(seller_id).await?)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Car>, ListingError> {
        Ok(self.cars.search(query).await?)
    }

    pub async fn update(&self, id: &str, acting_user: Uuid, patch: CarPatch) -> Result<Car, ListingError> {
        let id = parse_id(id)?;
        validate_patch(&patch)?;

        let updated = self
            .cars
            .update_owned(id, acting_user, &normalize_patch(patch))
            .await
            .map_err(|e| owner_error(e, "update"))?;

        info!("Updated car {}", id);
        Ok(updated.current)
    }

    /// Replace fields and, when an upload is given, the image. The new file
    /// is written before the update commits and the old one removed after.
    pub async fn update_with_image(
        &self,
        id: &str,
        acting_user: Uuid,
        mut patch: CarPatch,
        upload: Option<&ImageUpload>,
    ) -> Result<Car, ListingError> {
        let Some(upload) = upload else {
            return self.update(id, acting_user, patch).await;
        };

        let car_id = parse_id(id)?;
        validate_patch(&patch)?;

        // Fail fast before writing anything to disk
        let existing = self.cars.find(car_id).await?.ok_or(ListingError::NotFound)?;
        if existing.seller_id != acting_user {
            return Err(ListingError::Forbidden("update"));
        }

        let stored = self.images.store(upload).await?;
        patch.image = Some(stored.url.clone());

        let updated = match self
            .cars
            .update_owned(car_id, acting_user, &normalize_patch(patch))
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.discard(&stored).await;
                return Err(owner_error(e, "update"));
            }
        };

        if updated.previous.image != updated.current.image {
            self.release(car_id, &updated.previous.image).await;
        }

        info!("Updated car {} with new image {}", car_id, stored.filename);
        Ok(updated.current)
    }

    pub async fn delete(&self, id: &str, acting_user: Uuid) -> Result<(), ListingError> {
        let id = parse_id(id)?;
        let removed = self
            .cars
            .delete_owned(id, acting_user)
            .await
            .map_err(|e| owner_error(e, "delete"))?;

        info!("Deleted car {}", id);
        self.release(id, &removed.image).await;
        Ok(())
    }

    /// Best-effort removal of an asset no listing references any more
    async fn release(&self, car_id: Uuid, image: &str) {
        match self.images.remove_url(image).await {
            Ok(()) => {}
            Err(AssetError::NotFound(name)) => {
                debug!("Image {} of car {} was already gone", name, car_id);
            }
            Err(e) => {
                warn!("Failed to remove image '{}' of car {}: {}", image, car_id, e);
            }
        }
    }

    async fn discard(&self, stored: &StoredImage) {
        if let Err(e) = self.images.remove(&stored.filename).await {
            warn!("Failed to discard uncommitted image {}: {}", stored.filename, e);
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, ListingError> {
    Uuid::parse_str(id).map_err(|_| ListingError::NotFound)
}

fn owner_error(err: DatabaseError, action: &'static str) -> ListingError {
    match err {
        DatabaseError::NotOwner => ListingError::Forbidden(action),
        other => other.into(),
    }
}

fn normalize(mut new: NewCar) -> NewCar {
    new.price = new.price.round_dp(2);
    new
}

fn normalize_patch(mut patch: CarPatch) -> CarPatch {
    patch.price = patch.price.map(|p| p.round_dp(2));
    patch
}

fn validate_new(new: &NewCar) -> Result<(), ListingError> {
    validate_year(new.year)?;
    validate_price(new.price)?;
    validate_mileage(new.mileage)?;
    for (field, value) in [
        ("make", &new.make),
        ("model", &new.model),
        ("color", &new.color),
        ("fuel_type", &new.fuel_type),
        ("transmission", &new.transmission),
    ] {
        validate_text(field, value)?;
    }
    Ok(())
}

fn validate_patch(patch: &CarPatch) -> Result<(), ListingError> {
    if let Some(year) = patch.year {
        validate_year(year)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(mileage) = patch.mileage {
        validate_mileage(mileage)?;
    }
    for (field, value) in [
        ("make", &patch.make),
        ("model", &patch.model),
        ("color", &patch.color),
        ("fuel_type", &patch.fuel_type),
        ("transmission", &patch.transmission),
        ("image", &patch.image),
    ] {
        if let Some(value) = value {
            validate_text(field, value)?;
        }
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<(), ListingError> {
    let latest = Utc::now().year() + 1;
    if !(EARLIEST_MODEL_YEAR..=latest).contains(&year) {
        return Err(ListingError::Validation(format!(
            "year must be between {} and {}",
            EARLIEST_MODEL_YEAR, latest
        )));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ListingError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ListingError::Validation("price must not be negative".to_string()));
    }
    Ok(())
}

fn validate_mileage(mileage: i64) -> Result<(), ListingError> {
    if mileage < 0 {
        return Err(ListingError::Validation("mileage must not be negative".to_string()));
    }
    Ok(())
}

fn validate_text(field: &str, value: &str) -> Result<(), ListingError> {
    if value.trim().is_empty() {
        return Err(ListingError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
