pub mod credential_service;
pub mod image_service;
pub mod listing_service;

pub use credential_service::{CredentialError, CredentialService};
pub use image_service::{AssetError, ImageStore, ImageUpload, StoredImage};
pub use listing_service::{ListingError, ListingService};
