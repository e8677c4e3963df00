//! Response types for HTTP handlers.

mod admin;
mod envelope;
mod error_response;
mod monitors;
mod user;

pub use admin::*;
pub use envelope::*;
pub use error_response::ErrorResponse;
pub use monitors::*;
pub use user::*;
