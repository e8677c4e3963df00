#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for backend adapters.
pub const TRACING_TARGET_BACKEND: &str = "pitchside_vector::backend";

/// Tracing target for collection bootstrap.
pub const TRACING_TARGET_BOOTSTRAP: &str = "pitchside_vector::bootstrap";

/// Tracing target for document upserts.
pub const TRACING_TARGET_UPSERT: &str = "pitchside_vector::upsert";

/// Tracing target for searches.
pub const TRACING_TARGET_SEARCH: &str = "pitchside_vector::search";

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod embed;
pub mod error;
pub mod filter;
pub mod identity;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod prelude;
pub mod schema;
pub mod search;
pub mod types;
pub mod upsert;

pub use backend::{QdrantBackend, QdrantConfig, QueryShape, VectorBackend};
pub use bootstrap::{BootstrapReport, CollectionBootstrapper};
pub use config::{Distance, IdentifierStorage, IndexConfig};
pub use embed::Embedder;
pub use error::{
    BackendError, BackendErrorKind, BackendResult, BoxedError, EmbeddingError, VectorError,
    VectorResult,
};
pub use filter::{FilterValue, SearchFilter};
pub use identity::{MatchKey, point_id};
pub use schema::{SchemaKind, SchemaPlanner};
pub use search::{
    ForbiddenError, ForbiddenStage, QueryApi, SearchError, SearchResults, Searcher, SearcherConfig,
};
pub use types::{CollectionInfo, Document, Payload, Point, SearchHit};
pub use upsert::{IndexReport, Upserter};
