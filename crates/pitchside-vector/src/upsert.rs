//! Idempotent document upsert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_UPSERT;
use crate::backend::{QueryShape, VectorBackend};
use crate::bootstrap::CollectionBootstrapper;
use crate::embed::Embedder;
use crate::filter::SearchFilter;
use crate::identity::{MatchKey, point_id};
use crate::types::{Document, Point, SearchHit};

/// Per-batch counts returned by [`Upserter::push`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Documents written as new points.
    pub inserted: usize,
    /// Documents that replaced an existing point.
    pub updated: usize,
    /// Documents rejected before any write.
    pub skipped: usize,
    /// Documents whose write failed.
    pub failed: usize,
}

impl IndexReport {
    /// Returns the number of documents that were written.
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }

    /// Returns the number of documents the report accounts for.
    pub fn total(&self) -> usize {
        self.written() + self.skipped + self.failed
    }
}

/// Writes documents as points keyed by their match identifier.
///
/// Re-pushing a document for the same match overwrites the previous point,
/// so a collection holds at most one point per match.
#[derive(Clone)]
pub struct Upserter {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn Embedder>,
    bootstrapper: CollectionBootstrapper,
}

impl Upserter {
    /// Creates an upserter.
    ///
    /// The bootstrapper recreates a collection that disappears mid-batch.
    pub fn new(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        bootstrapper: CollectionBootstrapper,
    ) -> Self {
        Self {
            backend,
            embedder,
            bootstrapper,
        }
    }

    /// Upserts every document into `collection`, one at a time.
    ///
    /// Never fails as a whole: every problem is logged and counted in the
    /// returned report.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_UPSERT, fields(collection = %collection, documents = documents.len()))]
    pub async fn push(&self, documents: &[Document], collection: &str) -> IndexReport {
        let mut report = IndexReport::default();

        if documents.is_empty() {
            tracing::warn!(
                target: TRACING_TARGET_UPSERT,
                collection,
                "No documents to upsert"
            );
            return report;
        }

        for document in documents {
            self.push_one(document, collection, &mut report).await;
        }

        tracing::info!(
            target: TRACING_TARGET_UPSERT,
            collection,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Upsert batch finished"
        );

        report
    }

    async fn push_one(&self, document: &Document, collection: &str, report: &mut IndexReport) {
        let Some(key) = document.match_key() else {
            tracing::warn!(
                target: TRACING_TARGET_UPSERT,
                collection,
                preview = %document.preview(),
                "Skipping document without match_id"
            );
            report.skipped += 1;
            return;
        };

        let id = point_id(&key);

        let exists = match self.backend.retrieve(collection, id).await {
            Ok(payload) => payload.is_some(),
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_UPSERT,
                    collection,
                    match_id = %key,
                    error = %err,
                    "Existence check failed, treating as new"
                );
                false
            }
        };

        let vector = match self.embedder.embed(&document.text).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_UPSERT,
                    collection,
                    match_id = %key,
                    model = self.embedder.model_name(),
                    error = %err,
                    "Embedding failed"
                );
                report.skipped += 1;
                return;
            }
        };

        let expected = self.bootstrapper.planner().config().vector_dim;
        if vector.is_empty() || vector.len() != expected {
            tracing::warn!(
                target: TRACING_TARGET_UPSERT,
                collection,
                match_id = %key,
                expected,
                actual = vector.len(),
                "Embedding has the wrong dimension"
            );
            report.skipped += 1;
            return;
        }

        let point = Point {
            id,
            vector,
            payload: document.to_payload(),
        };

        let result = match self.backend.upsert(collection, point.clone()).await {
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    target: TRACING_TARGET_UPSERT,
                    collection,
                    match_id = %key,
                    "Collection missing, bootstrapping and retrying once"
                );
                self.bootstrapper.ensure(collection).await;
                self.backend.upsert(collection, point).await
            }
            result => result,
        };

        match result {
            Ok(()) if exists => {
                report.updated += 1;
                tracing::debug!(target: TRACING_TARGET_UPSERT, collection, match_id = %key, %id, "Updated point");
            }
            Ok(()) => {
                report.inserted += 1;
                tracing::debug!(target: TRACING_TARGET_UPSERT, collection, match_id = %key, %id, "Inserted point");
            }
            Err(err) => {
                report.failed += 1;
                tracing::error!(
                    target: TRACING_TARGET_UPSERT,
                    collection,
                    match_id = %key,
                    error = %err,
                    "Upsert failed"
                );
            }
        }
    }

    /// Returns the points stored for a match, without ranking.
    ///
    /// Uses a filtered scroll, falling back to a filtered zero-vector query.
    /// Returns an empty list when both fail.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_UPSERT, fields(collection = %collection, match_id = %key))]
    pub async fn fetch_by_match_id(
        &self,
        collection: &str,
        key: &MatchKey,
        limit: usize,
    ) -> Vec<SearchHit> {
        let config = self.bootstrapper.planner().config();
        let filter = SearchFilter::match_id(key, config.identifier_storage);

        let scroll_err = match self.backend.scroll(collection, Some(&filter), limit).await {
            Ok(hits) => return hits,
            Err(err) => err,
        };

        tracing::warn!(
            target: TRACING_TARGET_UPSERT,
            collection,
            error = %scroll_err,
            "Scroll failed, falling back to a filtered query"
        );

        let zero = vec![0.0; config.vector_dim];
        match self
            .backend
            .query(QueryShape::Search, collection, &zero, limit, Some(&filter))
            .await
        {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| SearchHit { score: 0.0, ..hit })
                .collect(),
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_UPSERT,
                    collection,
                    error = %err,
                    "Failed to fetch points by match_id"
                );
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for Upserter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upserter")
            .field("model", &self.embedder.model_name())
            .field("bootstrapper", &self.bootstrapper)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::backend::{BackendOperation, MemoryBackend};
    use crate::config::{IdentifierStorage, IndexConfig, MATCH_STATS_COLLECTION};
    use crate::error::BackendErrorKind;
    use crate::mock::MockEmbedder;
    use crate::types::Payload;

    const DIM: usize = 16;

    fn metadata(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn upserter(backend: &MemoryBackend) -> Upserter {
        let backend: Arc<dyn VectorBackend> = Arc::new(backend.clone());
        let config = IndexConfig::default().with_vector_dim(DIM);
        let bootstrapper = CollectionBootstrapper::new(backend.clone(), config);
        Upserter::new(backend, Arc::new(MockEmbedder::new(DIM)), bootstrapper)
    }

    async fn bootstrapped() -> (MemoryBackend, Upserter) {
        let backend = MemoryBackend::new();
        let upserter = upserter(&backend);
        upserter.bootstrapper.ensure(MATCH_STATS_COLLECTION).await;
        (backend, upserter)
    }

    #[tokio::test]
    async fn test_second_push_overwrites_first() {
        let (backend, upserter) = bootstrapped().await;

        let first = Document::new("A", metadata(json!({"match_id": 9001, "home_team": "X"})));
        let report = upserter.push(&[first], MATCH_STATS_COLLECTION).await;
        assert_eq!(report.inserted, 1);

        let second = Document::new("B", metadata(json!({"match_id": "9001", "away_team": "Y"})));
        let report = upserter.push(&[second], MATCH_STATS_COLLECTION).await;
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 0);

        let points = backend.points(MATCH_STATS_COLLECTION).await;
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, point_id(&MatchKey::Integer(9001)));
        assert_eq!(
            points[0].payload,
            metadata(json!({"match_id": "9001", "away_team": "Y", "text": "B"}))
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_skipped_and_sibling_written() {
        let (backend, upserter) = bootstrapped().await;

        let documents = [
            Document::new("orphan", metadata(json!({"home_team": "X"}))),
            Document::new("null key", metadata(json!({"match_id": null}))),
            Document::new("kept", metadata(json!({"match_id": 7}))),
        ];
        let report = upserter.push(&documents, MATCH_STATS_COLLECTION).await;

        assert_eq!(report.skipped, 2);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(backend.points(MATCH_STATS_COLLECTION).await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let (backend, upserter) = bootstrapped().await;
        let report = upserter.push(&[], MATCH_STATS_COLLECTION).await;

        assert_eq!(report, IndexReport::default());
        assert_eq!(backend.calls(BackendOperation::Upsert).await, 0);
    }

    #[tokio::test]
    async fn test_not_found_bootstraps_and_retries_once() {
        let backend = MemoryBackend::new();
        let upserter = upserter(&backend);

        let document = Document::new("fresh", metadata(json!({"match_id": 1})));
        let report = upserter.push(&[document], "lazy").await;

        assert_eq!(report.inserted, 1);
        assert_eq!(backend.calls(BackendOperation::Upsert).await, 2);
        assert!(backend.has_collection("lazy").await);
    }

    #[tokio::test]
    async fn test_failed_retry_counts_as_failed() {
        let (backend, upserter) = bootstrapped().await;
        backend
            .fail(
                BackendOperation::Upsert,
                Some(MATCH_STATS_COLLECTION),
                BackendErrorKind::NotFound,
            )
            .await;

        let document = Document::new("doomed", metadata(json!({"match_id": 1})));
        let report = upserter.push(&[document], MATCH_STATS_COLLECTION).await;

        assert_eq!(report.failed, 1);
        assert_eq!(backend.calls(BackendOperation::Upsert).await, 2);
    }

    #[tokio::test]
    async fn test_other_errors_do_not_abort_batch() {
        let (backend, upserter) = bootstrapped().await;
        backend
            .fail_once(
                BackendOperation::Upsert,
                Some(MATCH_STATS_COLLECTION),
                BackendErrorKind::Other,
            )
            .await;

        let documents = [
            Document::new("first", metadata(json!({"match_id": 1}))),
            Document::new("second", metadata(json!({"match_id": 2}))),
        ];
        let report = upserter.push(&documents, MATCH_STATS_COLLECTION).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(backend.calls(BackendOperation::Upsert).await, 2);
    }

    #[tokio::test]
    async fn test_existence_check_failure_treated_as_absent() {
        let (backend, upserter) = bootstrapped().await;
        backend
            .fail(BackendOperation::Retrieve, None, BackendErrorKind::Other)
            .await;

        let document = Document::new("text", metadata(json!({"match_id": 1})));
        let report = upserter.push(&[document], MATCH_STATS_COLLECTION).await;
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_skipped() {
        let backend = MemoryBackend::new();
        let shared: Arc<dyn VectorBackend> = Arc::new(backend.clone());
        let config = IndexConfig::default().with_vector_dim(DIM);
        let bootstrapper = CollectionBootstrapper::new(shared.clone(), config);
        let upserter = Upserter::new(shared, Arc::new(MockEmbedder::new(DIM + 1)), bootstrapper);

        let document = Document::new("text", metadata(json!({"match_id": 1})));
        let report = upserter.push(&[document], MATCH_STATS_COLLECTION).await;

        assert_eq!(report.skipped, 1);
        assert_eq!(backend.calls(BackendOperation::Upsert).await, 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_skipped() {
        let backend = MemoryBackend::new();
        let shared: Arc<dyn VectorBackend> = Arc::new(backend.clone());
        let config = IndexConfig::default().with_vector_dim(DIM);
        let bootstrapper = CollectionBootstrapper::new(shared.clone(), config);
        let upserter = Upserter::new(shared, Arc::new(MockEmbedder::failing()), bootstrapper);

        let document = Document::new("text", metadata(json!({"match_id": 1})));
        let report = upserter.push(&[document], MATCH_STATS_COLLECTION).await;
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_fetch_by_match_id_uses_typed_filter() {
        let (_backend, upserter) = bootstrapped().await;
        let documents = [
            Document::new("one", metadata(json!({"match_id": 1}))),
            Document::new("two", metadata(json!({"match_id": 2}))),
        ];
        upserter.push(&documents, MATCH_STATS_COLLECTION).await;

        let hits = upserter
            .fetch_by_match_id(MATCH_STATS_COLLECTION, &MatchKey::from("2"), 10)
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload["text"], json!("two"));
        assert_eq!(hits[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_padded_key_is_found_by_its_own_key() {
        let backend = MemoryBackend::new();
        let shared: Arc<dyn VectorBackend> = Arc::new(backend.clone());
        let config = IndexConfig::default()
            .with_vector_dim(DIM)
            .with_identifier_storage(IdentifierStorage::Keyword);
        let bootstrapper = CollectionBootstrapper::new(shared.clone(), config);
        bootstrapper.ensure(MATCH_STATS_COLLECTION).await;
        let upserter = Upserter::new(shared, Arc::new(MockEmbedder::new(DIM)), bootstrapper);

        let document = Document::new("padded", metadata(json!({"match_id": " 77 "})));
        let report = upserter.push(&[document], MATCH_STATS_COLLECTION).await;
        assert_eq!(report.inserted, 1);

        let points = backend.points(MATCH_STATS_COLLECTION).await;
        assert_eq!(points[0].id, Uuid::new_v5(&Uuid::NAMESPACE_DNS, b" 77 "));
        assert_eq!(points[0].payload["match_id"], json!(" 77 "));

        let key = MatchKey::from_value(&json!(" 77 ")).unwrap();
        let hits = upserter
            .fetch_by_match_id(MATCH_STATS_COLLECTION, &key, 10)
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, points[0].id.to_string());
    }

    #[tokio::test]
    async fn test_fetch_falls_back_then_gives_up() {
        let (backend, upserter) = bootstrapped().await;
        upserter
            .push(
                &[Document::new("one", metadata(json!({"match_id": 1})))],
                MATCH_STATS_COLLECTION,
            )
            .await;
        backend
            .fail(BackendOperation::Scroll, None, BackendErrorKind::Other)
            .await;

        let hits = upserter
            .fetch_by_match_id(MATCH_STATS_COLLECTION, &MatchKey::Integer(1), 10)
            .await;
        assert_eq!(hits.len(), 1);

        backend
            .fail(BackendOperation::Query, None, BackendErrorKind::Other)
            .await;
        let hits = upserter
            .fetch_by_match_id(MATCH_STATS_COLLECTION, &MatchKey::Integer(1), 10)
            .await;
        assert!(hits.is_empty());
    }
}
