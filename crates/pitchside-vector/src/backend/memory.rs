//! In-process backend with fault injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use strum::{AsRefStr, Display};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::TRACING_TARGET_BACKEND;
use crate::backend::{QueryShape, VectorBackend};
use crate::config::Distance;
use crate::error::{BackendError, BackendErrorKind, BackendResult};
use crate::filter::SearchFilter;
use crate::schema::SchemaKind;
use crate::types::{CollectionInfo, Payload, Point, SearchHit};

/// Backend operation a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BackendOperation {
    ListCollections,
    CollectionInfo,
    CreateCollection,
    CreatePayloadIndex,
    Retrieve,
    Upsert,
    Query,
    Scroll,
}

#[derive(Debug, Clone, Copy)]
struct Fault {
    kind: BackendErrorKind,
    once: bool,
}

#[derive(Debug)]
struct MemoryCollection {
    vector_dim: usize,
    distance: Distance,
    indexes: BTreeMap<String, SchemaKind>,
    points: BTreeMap<Uuid, Point>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<String, MemoryCollection>,
    faults: HashMap<(BackendOperation, Option<String>), Fault>,
    calls: HashMap<BackendOperation, usize>,
    legacy_only: bool,
}

impl MemoryState {
    /// Records the call and returns the injected failure, if any.
    ///
    /// A fault registered for the collection wins over a wildcard one.
    fn enter(&mut self, operation: BackendOperation, collection: &str) -> BackendResult<()> {
        *self.calls.entry(operation).or_default() += 1;

        let scoped = (operation, Some(collection.to_owned()));
        let wildcard = (operation, None);
        let key = if self.faults.contains_key(&scoped) {
            scoped
        } else if self.faults.contains_key(&wildcard) {
            wildcard
        } else {
            return Ok(());
        };

        let Some(fault) = self.faults.get(&key).copied() else {
            return Ok(());
        };
        if fault.once {
            self.faults.remove(&key);
        }

        Err(BackendError::new(
            fault.kind,
            format!("injected {operation} failure on '{collection}'"),
        ))
    }

    fn collection(&self, name: &str) -> BackendResult<&MemoryCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| BackendError::not_found(format!("collection '{name}' does not exist")))
    }
}

/// [`VectorBackend`] that keeps everything in memory.
///
/// Filters compare with strict typing, so a keyword filter never matches an
/// integer payload value. Faults can be injected per operation, optionally
/// scoped to one collection, either persistently or for a single call.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every call to `operation`, on `collection` or on any collection.
    pub async fn fail(
        &self,
        operation: BackendOperation,
        collection: Option<&str>,
        kind: BackendErrorKind,
    ) {
        self.insert_fault(operation, collection, Fault { kind, once: false })
            .await;
    }

    /// Fails the next call to `operation` only.
    pub async fn fail_once(
        &self,
        operation: BackendOperation,
        collection: Option<&str>,
        kind: BackendErrorKind,
    ) {
        self.insert_fault(operation, collection, Fault { kind, once: true })
            .await;
    }

    /// Removes every injected fault.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    /// Makes [`QueryShape::Query`] fail with a schema mismatch, as an older
    /// server does.
    pub async fn set_legacy_only(&self, legacy_only: bool) {
        self.state.write().await.legacy_only = legacy_only;
    }

    /// Returns how many times `operation` was called, failures included.
    pub async fn calls(&self, operation: BackendOperation) -> usize {
        let state = self.state.read().await;
        state.calls.get(&operation).copied().unwrap_or_default()
    }

    /// Returns the stored points of a collection, ordered by id.
    pub async fn points(&self, collection: &str) -> Vec<Point> {
        let state = self.state.read().await;
        state
            .collections
            .get(collection)
            .map(|c| c.points.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns a stored point.
    pub async fn point(&self, collection: &str, id: Uuid) -> Option<Point> {
        let state = self.state.read().await;
        state
            .collections
            .get(collection)
            .and_then(|c| c.points.get(&id).cloned())
    }

    /// Returns the payload indexes of a collection.
    pub async fn indexes(&self, collection: &str) -> BTreeMap<String, SchemaKind> {
        let state = self.state.read().await;
        state
            .collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default()
    }

    /// Returns whether a collection exists.
    pub async fn has_collection(&self, collection: &str) -> bool {
        self.state.read().await.collections.contains_key(collection)
    }

    /// Drops a collection and everything in it.
    pub async fn drop_collection(&self, collection: &str) {
        self.state.write().await.collections.remove(collection);
    }

    async fn insert_fault(
        &self,
        operation: BackendOperation,
        collection: Option<&str>,
        fault: Fault,
    ) {
        self.state
            .write()
            .await
            .faults
            .insert((operation, collection.map(str::to_owned)), fault);
    }
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    async fn list_collections(&self) -> BackendResult<Vec<String>> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::ListCollections, "*")?;
        Ok(state.collections.keys().cloned().collect())
    }

    async fn collection_info(&self, collection: &str) -> BackendResult<CollectionInfo> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::CollectionInfo, collection)?;
        let indexed_fields = state.collection(collection)?.indexes.keys().cloned().collect();
        Ok(CollectionInfo { indexed_fields })
    }

    async fn create_collection(
        &self,
        collection: &str,
        vector_dim: usize,
        distance: Distance,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::CreateCollection, collection)?;

        if state.collections.contains_key(collection) {
            return Err(BackendError::already_exists(format!(
                "collection '{collection}' already exists"
            )));
        }

        state.collections.insert(
            collection.to_owned(),
            MemoryCollection {
                vector_dim,
                distance,
                indexes: BTreeMap::new(),
                points: BTreeMap::new(),
            },
        );

        tracing::trace!(
            target: TRACING_TARGET_BACKEND,
            collection,
            vector_dim,
            "Created in-memory collection"
        );
        Ok(())
    }

    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        schema: SchemaKind,
    ) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::CreatePayloadIndex, collection)?;

        let Some(entry) = state.collections.get_mut(collection) else {
            return Err(BackendError::not_found(format!(
                "collection '{collection}' does not exist"
            )));
        };

        if entry.indexes.contains_key(field) {
            return Err(BackendError::already_exists(format!(
                "index on '{field}' already exists"
            )));
        }

        entry.indexes.insert(field.to_owned(), schema);
        Ok(())
    }

    async fn retrieve(&self, collection: &str, id: Uuid) -> BackendResult<Option<Payload>> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::Retrieve, collection)?;
        let entry = state.collection(collection)?;
        Ok(entry.points.get(&id).map(|point| point.payload.clone()))
    }

    async fn upsert(&self, collection: &str, point: Point) -> BackendResult<()> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::Upsert, collection)?;

        let Some(entry) = state.collections.get_mut(collection) else {
            return Err(BackendError::not_found(format!(
                "collection '{collection}' does not exist"
            )));
        };

        if point.vector.len() != entry.vector_dim {
            return Err(BackendError::other(format!(
                "wrong vector dimension: expected {}, got {}",
                entry.vector_dim,
                point.vector.len()
            )));
        }

        entry.points.insert(point.id, point);
        Ok(())
    }

    async fn query(
        &self,
        shape: QueryShape,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::Query, collection)?;

        if shape == QueryShape::Query && state.legacy_only {
            return Err(BackendError::schema_mismatch(
                "query endpoint is not available on this server",
            ));
        }

        let entry = state.collection(collection)?;
        let mut hits: Vec<SearchHit> = entry
            .points
            .values()
            .filter(|point| filter.is_none_or(|f| f.matches(&point.payload)))
            .map(|point| SearchHit {
                id: point.id.to_string(),
                payload: point.payload.clone(),
                score: score(entry.distance, vector, &point.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&SearchFilter>,
        limit: usize,
    ) -> BackendResult<Vec<SearchHit>> {
        let mut state = self.state.write().await;
        state.enter(BackendOperation::Scroll, collection)?;

        let entry = state.collection(collection)?;
        Ok(entry
            .points
            .values()
            .filter(|point| filter.is_none_or(|f| f.matches(&point.payload)))
            .take(limit)
            .map(|point| SearchHit {
                id: point.id.to_string(),
                payload: point.payload.clone(),
                score: 0.0,
            })
            .collect())
    }
}

/// Higher is closer.
fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn point(id: u128, vector: Vec<f32>, payload: serde_json::Value) -> Point {
        Point {
            id: Uuid::from_u128(id),
            vector,
            payload: payload.as_object().cloned().unwrap(),
        }
    }

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend
            .create_collection("stats", 2, Distance::Cosine)
            .await
            .unwrap();
        backend
            .upsert("stats", point(1, vec![1.0, 0.0], json!({"match_id": 1})))
            .await
            .unwrap();
        backend
            .upsert("stats", point(2, vec![0.0, 1.0], json!({"match_id": 2})))
            .await
            .unwrap();
        backend
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let backend = seeded().await;
        let hits = backend
            .query(QueryShape::Query, "stats", &[0.9, 0.1], 10, None)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, Uuid::from_u128(1).to_string());
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_filter_is_type_strict() {
        let backend = seeded().await;

        let integer = SearchFilter::integer("match_id", 2);
        let hits = backend
            .query(QueryShape::Query, "stats", &[1.0, 0.0], 10, Some(&integer))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let keyword = SearchFilter::keyword("match_id", "2");
        let hits = backend
            .query(QueryShape::Search, "stats", &[1.0, 0.0], 10, Some(&keyword))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.collection_info("nope").await.unwrap_err();
        assert!(err.is_not_found());

        let err = backend
            .upsert("nope", point(1, vec![1.0], json!({})))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_create_is_already_exists() {
        let backend = seeded().await;
        let err = backend
            .create_collection("stats", 2, Distance::Cosine)
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_rejected() {
        let backend = seeded().await;
        let err = backend
            .upsert("stats", point(3, vec![1.0, 0.0, 0.0], json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), BackendErrorKind::Other);
    }

    #[tokio::test]
    async fn test_fail_once_clears_after_first_call() {
        let backend = seeded().await;
        backend
            .fail_once(BackendOperation::Scroll, Some("stats"), BackendErrorKind::Other)
            .await;

        assert!(backend.scroll("stats", None, 10).await.is_err());
        assert_eq!(backend.scroll("stats", None, 10).await.unwrap().len(), 2);
        assert_eq!(backend.calls(BackendOperation::Scroll).await, 2);
    }

    #[tokio::test]
    async fn test_scoped_fault_leaves_other_collections() {
        let backend = seeded().await;
        backend
            .create_collection("details", 2, Distance::Cosine)
            .await
            .unwrap();
        backend
            .fail(BackendOperation::Query, Some("stats"), BackendErrorKind::Forbidden)
            .await;

        let err = backend
            .query(QueryShape::Query, "stats", &[1.0, 0.0], 1, None)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
        assert!(
            backend
                .query(QueryShape::Query, "details", &[1.0, 0.0], 1, None)
                .await
                .is_ok()
        );

        backend.clear_faults().await;
        assert!(
            backend
                .query(QueryShape::Query, "stats", &[1.0, 0.0], 1, None)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_legacy_only_rejects_query_shape() {
        let backend = seeded().await;
        backend.set_legacy_only(true).await;

        let err = backend
            .query(QueryShape::Query, "stats", &[1.0, 0.0], 1, None)
            .await
            .unwrap_err();
        assert!(err.is_schema_mismatch());
        assert!(
            backend
                .query(QueryShape::Search, "stats", &[1.0, 0.0], 1, None)
                .await
                .is_ok()
        );
    }

    #[test]
    fn test_cosine_handles_zero_vector() {
        assert_eq!(score(Distance::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((score(Distance::Cosine, &[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
