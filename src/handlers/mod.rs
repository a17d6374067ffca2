// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) and protected (bearer access token). Routes are wired up
// in main.rs.

pub mod extract;
pub mod multipart;
pub mod protected;
pub mod public;
