//! Request types for HTTP handlers.

mod admin;
mod user;
mod validations;

pub use admin::*;
pub use user::*;
pub use validations::*;
