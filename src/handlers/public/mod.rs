// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and read-only listing access.

pub mod auth;
pub mod cars;
