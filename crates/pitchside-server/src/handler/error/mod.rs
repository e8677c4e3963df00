//! [`Error`], [`ErrorKind`] and [`Result`].

mod feed_error;
mod http_error;
mod search_error;
mod store_error;

pub use http_error::{Error, ErrorKind, Result};
