#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod store;

pub use config::{StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use store::{DocumentStore, Record, UPDATED_AT_FIELD, UpsertStatus};

/// Tracing target for document store operations.
pub const TRACING_TARGET: &str = "pitchside_opendal";
