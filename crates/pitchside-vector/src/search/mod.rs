//! Multi-collection filtered search.
//!
//! One question is embedded once and queried against every configured
//! collection in turn, each with its own filter. Failures stay local to the
//! collection that produced them, except a credential rejection, which is
//! raised to the caller.

mod config;
mod error;

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

pub use self::config::{DEFAULT_SEARCH_TIMEOUT, DEFAULT_TOP_K, QueryApi, SearcherConfig};
pub use self::error::{ForbiddenError, ForbiddenStage, SearchError};
use crate::TRACING_TARGET_SEARCH;
use crate::backend::{QueryShape, VectorBackend};
use crate::embed::Embedder;
use crate::error::{BackendError, BackendResult};
use crate::filter::SearchFilter;
use crate::types::SearchHit;

/// Hits keyed by collection name.
pub type SearchResults = BTreeMap<String, Vec<SearchHit>>;

const SHAPE_QUERY: u8 = 0;
const SHAPE_SEARCH: u8 = 1;

fn encode_shape(shape: QueryShape) -> u8 {
    match shape {
        QueryShape::Query => SHAPE_QUERY,
        QueryShape::Search => SHAPE_SEARCH,
    }
}

fn decode_shape(value: u8) -> QueryShape {
    if value == SHAPE_SEARCH {
        QueryShape::Search
    } else {
        QueryShape::Query
    }
}

/// Embeds questions and queries the configured collections.
///
/// Clones share the negotiated query shape.
#[derive(Clone)]
pub struct Searcher {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn Embedder>,
    config: SearcherConfig,
    shape: Arc<AtomicU8>,
}

impl Searcher {
    /// Creates a searcher, running the self-test unless it is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Forbidden`] when the self-test is rejected for
    /// credentials, and [`SearchError::Initialization`] for any other
    /// self-test failure.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SEARCH, fields(collections = ?config.collections))]
    pub async fn connect(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn Embedder>,
        config: SearcherConfig,
    ) -> Result<Self, SearchError> {
        let initial = match config.query_api {
            QueryApi::Auto | QueryApi::Query => QueryShape::Query,
            QueryApi::Search => QueryShape::Search,
        };

        let searcher = Self {
            backend,
            embedder,
            config,
            shape: Arc::new(AtomicU8::new(encode_shape(initial))),
        };

        if searcher.config.run_self_test {
            searcher.self_test().await?;
        }

        tracing::info!(
            target: TRACING_TARGET_SEARCH,
            query_api = %searcher.config.query_api,
            model = searcher.embedder.model_name(),
            "Searcher ready"
        );

        Ok(searcher)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SearcherConfig {
        &self.config
    }

    /// Returns the call shape the next query will use.
    pub fn query_shape(&self) -> QueryShape {
        decode_shape(self.shape.load(Ordering::Relaxed))
    }

    async fn self_test(&self) -> Result<(), SearchError> {
        match self.timed(self.backend.list_collections()).await {
            Ok(collections) => {
                tracing::debug!(
                    target: TRACING_TARGET_SEARCH,
                    visible = collections.len(),
                    "Self-test passed"
                );
                Ok(())
            }
            Err(err) if err.is_forbidden() => {
                tracing::error!(
                    target: TRACING_TARGET_SEARCH,
                    error = %err,
                    "Self-test rejected, check the API key"
                );
                Err(ForbiddenError::new(ForbiddenStage::SelfTest, None, err).into())
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_SEARCH,
                    error = %err,
                    "Self-test failed"
                );
                Err(SearchError::Initialization(err))
            }
        }
    }

    /// Searches every configured collection.
    ///
    /// `top_k` defaults to the configured value. A collection without an
    /// entry in `filters` is queried unfiltered. Every configured collection
    /// appears in the result, with an empty list when its query failed.
    ///
    /// # Errors
    ///
    /// Fails when the question cannot be embedded or a query is rejected for
    /// credentials.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_SEARCH, fields(top_k = top_k.unwrap_or(self.config.top_k)))]
    pub async fn search(
        &self,
        question: &str,
        top_k: Option<usize>,
        filters: &HashMap<String, SearchFilter>,
    ) -> Result<SearchResults, SearchError> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let vector = self.embedder.embed(question).await?;

        let mut results = SearchResults::new();
        for collection in &self.config.collections {
            let filter = filters.get(collection);

            let hits = match self.query_collection(collection, &vector, top_k, filter).await {
                Ok(hits) => hits,
                Err(err) if err.is_forbidden() => {
                    tracing::error!(
                        target: TRACING_TARGET_SEARCH,
                        collection = %collection,
                        error = %err,
                        "Query rejected, check the API key"
                    );
                    return Err(
                        ForbiddenError::new(ForbiddenStage::Query, Some(collection), err).into(),
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_SEARCH,
                        collection = %collection,
                        error = %err,
                        "Query failed, returning no hits for this collection"
                    );
                    Vec::new()
                }
            };

            tracing::debug!(
                target: TRACING_TARGET_SEARCH,
                collection = %collection,
                hits = hits.len(),
                "Collection searched"
            );
            results.insert(collection.clone(), hits);
        }

        Ok(results)
    }

    /// Queries one collection with the negotiated shape.
    ///
    /// In [`QueryApi::Auto`] a schema mismatch is retried once with the other
    /// shape, which is remembered when it succeeds.
    async fn query_collection(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> BackendResult<Vec<SearchHit>> {
        let shape = self.query_shape();
        let first = self
            .timed(self.backend.query(shape, collection, vector, limit, filter))
            .await;

        let err = match first {
            Err(err) if err.is_schema_mismatch() && self.config.query_api == QueryApi::Auto => err,
            result => return result,
        };

        let fallback = shape.fallback();
        tracing::warn!(
            target: TRACING_TARGET_SEARCH,
            collection,
            from = %shape,
            to = %fallback,
            error = %err,
            "Query shape rejected, retrying with the other shape"
        );

        let hits = self
            .timed(self.backend.query(fallback, collection, vector, limit, filter))
            .await?;

        self.shape.store(encode_shape(fallback), Ordering::Relaxed);
        tracing::info!(
            target: TRACING_TARGET_SEARCH,
            shape = %fallback,
            "Remembering negotiated query shape"
        );

        Ok(hits)
    }

    async fn timed<T>(&self, call: impl Future<Output = BackendResult<T>>) -> BackendResult<T> {
        tokio::time::timeout(self.config.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(BackendError::other(format!(
                    "timed out after {}s",
                    self.config.timeout.as_secs_f32()
                )))
            })
    }
}

impl std::fmt::Debug for Searcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Searcher")
            .field("config", &self.config)
            .field("query_shape", &self.query_shape())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::backend::{BackendOperation, MemoryBackend};
    use crate::bootstrap::CollectionBootstrapper;
    use crate::config::{
        Distance, IdentifierStorage, IndexConfig, MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION,
    };
    use crate::error::BackendErrorKind;
    use crate::identity::{MatchKey, point_id};
    use crate::mock::MockEmbedder;
    use crate::schema::SchemaKind;
    use crate::types::{CollectionInfo, Document, Payload, Point};
    use crate::upsert::Upserter;

    const DIM: usize = 32;

    fn metadata(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(MockEmbedder::new(DIM))
    }

    async fn indexed(backend: &MemoryBackend, collections: &[&str]) -> Upserter {
        let shared: Arc<dyn VectorBackend> = Arc::new(backend.clone());
        let mut config = IndexConfig::default().with_vector_dim(DIM);
        for collection in collections {
            config = config.with_collection(*collection, ["match_id"]);
        }

        let bootstrapper = CollectionBootstrapper::new(shared.clone(), config);
        bootstrapper.ensure_all().await;
        Upserter::new(shared, embedder(), bootstrapper)
    }

    async fn searcher(backend: &MemoryBackend, config: SearcherConfig) -> Searcher {
        Searcher::connect(Arc::new(backend.clone()), embedder(), config)
            .await
            .unwrap()
    }

    fn match_filter(collections: &[&str], key: i64) -> HashMap<String, SearchFilter> {
        collections
            .iter()
            .map(|c| (c.to_string(), SearchFilter::integer("match_id", key)))
            .collect()
    }

    #[tokio::test]
    async fn test_push_then_search_by_match_id() {
        let backend = MemoryBackend::new();
        let upserter = indexed(&backend, &[]).await;

        let document = Document::new(
            "Team A bats first at Ground X",
            metadata(json!({"match_id": 9001})),
        );
        let noise = Document::new("Team C bowls first", metadata(json!({"match_id": 42})));
        upserter
            .push(&[document, noise], MATCH_STATS_COLLECTION)
            .await;

        let searcher = searcher(&backend, SearcherConfig::default()).await;
        let filter = SearchFilter::match_id(&MatchKey::Integer(9001), IdentifierStorage::Integer);
        let filters = HashMap::from([(MATCH_STATS_COLLECTION.to_owned(), filter)]);

        let results = searcher
            .search("Who bats first?", None, &filters)
            .await
            .unwrap();

        let hits = &results[MATCH_STATS_COLLECTION];
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, point_id(&MatchKey::Integer(9001)).to_string());
        assert_eq!(hits[0].payload["text"], json!("Team A bats first at Ground X"));
        assert!(results[MATCH_DETAILS_COLLECTION].is_empty());
    }

    #[tokio::test]
    async fn test_keyword_filter_on_integer_ids_finds_nothing() {
        let backend = MemoryBackend::new();
        let upserter = indexed(&backend, &[]).await;
        upserter
            .push(
                &[Document::new("text", metadata(json!({"match_id": 9001})))],
                MATCH_STATS_COLLECTION,
            )
            .await;
        assert_eq!(
            backend.indexes(MATCH_STATS_COLLECTION).await["match_id"],
            SchemaKind::Integer
        );

        let searcher = searcher(&backend, SearcherConfig::default()).await;
        let filters = HashMap::from([(
            MATCH_STATS_COLLECTION.to_owned(),
            SearchFilter::keyword("match_id", "9001"),
        )]);
        let results = searcher.search("anything", None, &filters).await.unwrap();
        assert!(results[MATCH_STATS_COLLECTION].is_empty());
    }

    #[tokio::test]
    async fn test_failing_collection_is_isolated() {
        let collections = ["alpha", "beta", "gamma"];
        let backend = MemoryBackend::new();
        let upserter = indexed(&backend, &collections).await;
        for collection in collections {
            upserter
                .push(
                    &[Document::new("same match", metadata(json!({"match_id": 1})))],
                    collection,
                )
                .await;
        }
        backend
            .fail(BackendOperation::Query, Some("beta"), BackendErrorKind::Other)
            .await;

        let searcher = searcher(&backend, SearcherConfig::new(collections)).await;
        let results = searcher
            .search("same match", None, &match_filter(&collections, 1))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results["alpha"].len(), 1);
        assert!(results["beta"].is_empty());
        assert_eq!(results["gamma"].len(), 1);
    }

    #[tokio::test]
    async fn test_forbidden_at_self_test() {
        let backend = MemoryBackend::new();
        backend
            .fail(
                BackendOperation::ListCollections,
                None,
                BackendErrorKind::Forbidden,
            )
            .await;

        let err = Searcher::connect(Arc::new(backend.clone()), embedder(), SearcherConfig::default())
            .await
            .unwrap_err();

        let forbidden = err.as_forbidden().unwrap();
        assert_eq!(forbidden.stage(), ForbiddenStage::SelfTest);
        assert_eq!(forbidden.hints().len(), 4);
        assert_eq!(backend.calls(BackendOperation::Query).await, 0);
    }

    #[tokio::test]
    async fn test_other_self_test_failure_is_initialization() {
        let backend = MemoryBackend::new();
        backend
            .fail(BackendOperation::ListCollections, None, BackendErrorKind::Other)
            .await;

        let err = Searcher::connect(Arc::new(backend.clone()), embedder(), SearcherConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Initialization(_)));

        let searcher = Searcher::connect(
            Arc::new(backend.clone()),
            embedder(),
            SearcherConfig::default().with_self_test(false),
        )
        .await;
        assert!(searcher.is_ok());
    }

    #[tokio::test]
    async fn test_forbidden_at_query_time() {
        let backend = MemoryBackend::new();
        indexed(&backend, &[]).await;
        let searcher = searcher(&backend, SearcherConfig::default()).await;

        backend
            .fail(
                BackendOperation::Query,
                Some(MATCH_STATS_COLLECTION),
                BackendErrorKind::Forbidden,
            )
            .await;

        let err = searcher
            .search("question", None, &HashMap::new())
            .await
            .unwrap_err();
        let forbidden = err.as_forbidden().unwrap();
        assert_eq!(forbidden.stage(), ForbiddenStage::Query);
        assert_eq!(forbidden.collection(), Some(MATCH_STATS_COLLECTION));
    }

    #[tokio::test]
    async fn test_legacy_shape_is_negotiated_and_remembered() {
        let backend = MemoryBackend::new();
        let upserter = indexed(&backend, &[]).await;
        upserter
            .push(
                &[Document::new("text", metadata(json!({"match_id": 5})))],
                MATCH_DETAILS_COLLECTION,
            )
            .await;
        backend.set_legacy_only(true).await;

        let searcher = searcher(&backend, SearcherConfig::default()).await;
        assert_eq!(searcher.query_shape(), QueryShape::Query);

        let results = searcher
            .search("text", None, &HashMap::new())
            .await
            .unwrap();
        assert_eq!(results[MATCH_DETAILS_COLLECTION].len(), 1);
        assert_eq!(searcher.query_shape(), QueryShape::Search);

        // one rejected current-shape call, then legacy for both collections
        assert_eq!(backend.calls(BackendOperation::Query).await, 3);

        searcher.clone().search("text", None, &HashMap::new()).await.unwrap();
        assert_eq!(backend.calls(BackendOperation::Query).await, 5);
    }

    #[tokio::test]
    async fn test_pinned_shape_does_not_fall_back() {
        let backend = MemoryBackend::new();
        indexed(&backend, &[]).await;
        backend.set_legacy_only(true).await;

        let config = SearcherConfig::default().with_query_api(QueryApi::Query);
        let searcher = searcher(&backend, config).await;
        let results = searcher.search("text", None, &HashMap::new()).await.unwrap();

        assert!(results.values().all(Vec::is_empty));
        assert_eq!(searcher.query_shape(), QueryShape::Query);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_an_error() {
        let backend = MemoryBackend::new();
        let searcher = Searcher::connect(
            Arc::new(backend),
            Arc::new(MockEmbedder::failing()),
            SearcherConfig::default(),
        )
        .await
        .unwrap();

        let err = searcher
            .search("question", None, &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Embedding(_)));
    }

    /// Backend whose queries never complete.
    struct Stalled;

    #[async_trait]
    impl VectorBackend for Stalled {
        async fn list_collections(&self) -> BackendResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn collection_info(&self, _: &str) -> BackendResult<CollectionInfo> {
            Ok(CollectionInfo::default())
        }

        async fn create_collection(&self, _: &str, _: usize, _: Distance) -> BackendResult<()> {
            Ok(())
        }

        async fn create_payload_index(&self, _: &str, _: &str, _: SchemaKind) -> BackendResult<()> {
            Ok(())
        }

        async fn retrieve(&self, _: &str, _: uuid::Uuid) -> BackendResult<Option<Payload>> {
            Ok(None)
        }

        async fn upsert(&self, _: &str, _: Point) -> BackendResult<()> {
            Ok(())
        }

        async fn query(
            &self,
            _: QueryShape,
            _: &str,
            _: &[f32],
            _: usize,
            _: Option<&SearchFilter>,
        ) -> BackendResult<Vec<SearchHit>> {
            std::future::pending().await
        }

        async fn scroll(
            &self,
            _: &str,
            _: Option<&SearchFilter>,
            _: usize,
        ) -> BackendResult<Vec<SearchHit>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_collection_failure() {
        let config = SearcherConfig::default().with_timeout(Duration::from_millis(20));
        let searcher = Searcher::connect(Arc::new(Stalled), embedder(), config)
            .await
            .unwrap();

        let results = searcher
            .search("question", Some(3), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.values().all(Vec::is_empty));
    }
}
