//! Convenient re-exports for common use.

pub use crate::backend::{QdrantBackend, QdrantConfig, VectorBackend};
pub use crate::bootstrap::CollectionBootstrapper;
pub use crate::config::{IdentifierStorage, IndexConfig};
pub use crate::embed::Embedder;
pub use crate::error::{BackendError, BackendErrorKind, EmbeddingError, VectorError, VectorResult};
pub use crate::filter::SearchFilter;
pub use crate::identity::MatchKey;
pub use crate::search::{SearchError, Searcher, SearcherConfig};
pub use crate::types::{Document, SearchHit};
pub use crate::upsert::{IndexReport, Upserter};
