// handlers/multipart.rs - Multipart form decoding shared by upload endpoints

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use rust_decimal::Decimal;

use crate::database::models::{CarPatch, NewCar};
use crate::error::ApiError;
use crate::services::ImageUpload;

/// Name of the form part carrying the image
pub const FILE_FIELD: &str = "file";

/// Text fields plus the optional `file` part of a multipart request
#[derive(Debug, Default)]
pub struct CarForm {
    fields: HashMap<String, String>,
    pub file: Option<ImageUpload>,
}

#[async_trait]
impl<S> FromRequest<S> for CarForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        CarForm::read(multipart).await
    }
}

impl CarForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = CarForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == FILE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // Browsers send an empty part when no file was chosen
                if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                    continue;
                }
                form.file = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn require_file(&mut self) -> Result<ImageUpload, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::validation_error("Field 'file' is required"))
    }

    /// All listing fields except `description` must be present
    pub fn new_car(&self) -> Result<NewCar, ApiError> {
        Ok(NewCar {
            make: self.required("make")?,
            model: self.required("model")?,
            year: self.required_parsed("year")?,
            price: self.required_parsed("price")?,
            mileage: self.required_parsed("mileage")?,
            description: self.optional("description"),
            color: self.required("color")?,
            fuel_type: self.required("fuel_type")?,
            transmission: self.required("transmission")?,
            image: String::new(),
        })
    }

    /// Blank or missing fields leave the stored value unchanged
    pub fn car_patch(&self) -> Result<CarPatch, ApiError> {
        Ok(CarPatch {
            make: self.optional("make"),
            model: self.optional("model"),
            year: self.optional_parsed("year")?,
            price: self.optional_parsed::<Decimal>("price")?,
            mileage: self.optional_parsed("mileage")?,
            description: self.optional("description"),
            color: self.optional("color"),
            fuel_type: self.optional("fuel_type"),
            transmission: self.optional("transmission"),
            image: None,
            is_sold: self
                .optional("is_sold")
                .map(|v| parse_bool("is_sold", &v))
                .transpose()?,
        })
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, name: &str) -> Result<String, ApiError> {
        self.optional(name)
            .ok_or_else(|| ApiError::validation_error(format!("Field '{}' is required", name)))
    }

    fn optional_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        self.optional(name).map(|v| parse_value(name, &v)).transpose()
    }

    fn required_parsed<T: FromStr>(&self, name: &str) -> Result<T, ApiError> {
        parse_value(name, &self.required(name)?)
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::validation_error(format!("Field '{}' has an invalid value: {}", name, value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::validation_error(format!(
            "Field '{}' has an invalid value: {}",
            name, value
        ))),
    }
}
