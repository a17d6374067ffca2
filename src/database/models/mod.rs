pub mod car;
pub mod user;

pub use car::{Car, CarPatch, NewCar};
pub use user::{Registration, User};
