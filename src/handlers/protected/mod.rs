// handlers/protected/mod.rs - Protected handlers (bearer access token required)
//
// Every handler here takes the `AuthUser` extractor, which answers 401 on
// its own before the handler body runs.

pub mod auth;
pub mod cars;
pub mod upload;
