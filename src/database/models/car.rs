use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A car listing owned by the user in `seller_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub mileage: i64,
    pub description: Option<String>,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub image: String,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_sold: bool,
}

/// Fields supplied when creating a listing
#[derive(Debug, Clone, Deserialize)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub mileage: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub image: String,
}

/// Partial update. `None` means "leave unchanged", never "clear".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarPatch {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_sold: Option<bool>,
}

impl Car {
    pub fn from_new(new: NewCar, seller_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            make: new.make,
            model: new.model,
            year: new.year,
            price: new.price,
            mileage: new.mileage,
            description: new.description,
            color: new.color,
            fuel_type: new.fuel_type,
            transmission: new.transmission,
            image: new.image,
            seller_id,
            created_at,
            is_sold: false,
        }
    }
}

impl CarPatch {
    /// Overwrite only the fields present in the patch
    pub fn apply(&self, car: &mut Car) {
        if let Some(v) = &self.make {
            car.make = v.clone();
        }
        if let Some(v) = &self.model {
            car.model = v.clone();
        }
        if let Some(v) = self.year {
            car.year = v;
        }
        if let Some(v) = self.price {
            car.price = v;
        }
        if let Some(v) = self.mileage {
            car.mileage = v;
        }
        if let Some(v) = &self.description {
            car.description = Some(v.clone());
        }
        if let Some(v) = &self.color {
            car.color = v.clone();
        }
        if let Some(v) = &self.fuel_type {
            car.fuel_type = v.clone();
        }
        if let Some(v) = &self.transmission {
            car.transmission = v.clone();
        }
        if let Some(v) = &self.image {
            car.image = v.clone();
        }
        if let Some(v) = self.is_sold {
            car.is_sold = v;
        }
    }
}
