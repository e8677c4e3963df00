//! Vector store backends.
//!
//! [`VectorBackend`] is the only seam between the indexing components and a
//! concrete store. Implementations classify every failure into a
//! [`BackendErrorKind`] before returning it.
//!
//! [`BackendErrorKind`]: crate::BackendErrorKind

#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod qdrant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
pub use self::memory::{BackendOperation, MemoryBackend};
pub use self::qdrant::{QdrantBackend, QdrantConfig};
use crate::config::Distance;
use crate::error::BackendResult;
use crate::filter::SearchFilter;
use crate::schema::SchemaKind;
use crate::types::{CollectionInfo, Payload, Point, SearchHit};

/// Call shape used for nearest-neighbour queries.
///
/// Servers and clients disagree across versions on which request carries the
/// filter; [`Searcher`] negotiates the shape once and remembers it.
///
/// [`Searcher`]: crate::search::Searcher
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueryShape {
    /// Universal query endpoint.
    Query,
    /// Legacy search endpoint.
    Search,
}

impl QueryShape {
    /// Returns the shape to try after a schema mismatch.
    pub fn fallback(self) -> Self {
        match self {
            Self::Query => Self::Search,
            Self::Search => Self::Query,
        }
    }
}

/// Operations the indexing layer needs from a vector store.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Lists collection names. Used as the connectivity self-test.
    async fn list_collections(&self) -> BackendResult<Vec<String>>;

    /// Reads collection metadata; `NotFound` when absent.
    async fn collection_info(&self, collection: &str) -> BackendResult<CollectionInfo>;

    /// Creates a collection; `AlreadyExists` when present.
    async fn create_collection(
        &self,
        collection: &str,
        vector_dim: usize,
        distance: Distance,
    ) -> BackendResult<()>;

    /// Creates a payload index; `AlreadyExists` when present.
    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: SchemaKind,
    ) -> BackendResult<()>;

    /// Retrieves a point payload by id; `Ok(None)` when absent.
    async fn retrieve(&self, collection: &str, id: Uuid) -> BackendResult<Option<Payload>>;

    /// Writes a point, overwriting any point with the same id.
    async fn upsert(&self, collection: &str, point: Point) -> BackendResult<()>;

    /// Runs a filtered nearest-neighbour query using the given call shape.
    async fn query(
        &self,
        shape: QueryShape,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>>;

    /// Returns points matching a filter without scoring.
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> BackendResult<Vec<SearchHit>>;
}
