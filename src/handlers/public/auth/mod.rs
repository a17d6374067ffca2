// handlers/public/auth/mod.rs - Token acquisition endpoints

pub mod login; // POST /login, POST /access-token
pub mod refresh; // POST /refresh-token
pub mod register; // POST /register

pub use login::login;
pub use refresh::refresh;
pub use register::register;
