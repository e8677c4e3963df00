//! Middleware for `axum::Router`.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use axum::Router;
//! use pitchside_server::middleware::RouterExt;
//!
//! let app: Router = Router::new()
//!     .with_body_limit_layer(1024 * 1024)
//!     .with_error_handling_layer(Duration::from_secs(300))
//!     .with_observability_layer();
//! ```

mod error_handling;
mod extensions;
mod observability;

pub use extensions::RouterExt;

/// Tracing target for middleware errors.
pub const TRACING_TARGET_MIDDLEWARE: &str = "pitchside_server::middleware";
