// handlers/protected/cars/mod.rs - Listing mutations (seller only)

pub mod create;
pub mod delete;
pub mod mine;
pub mod update;

pub use create::{create, create_with_upload};
pub use delete::delete;
pub use mine::mine;
pub use update::{update, update_with_upload};
