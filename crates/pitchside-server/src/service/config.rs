use std::sync::Arc;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use pitchside_feed::{FeedClient, FeedConfig, FixtureSource};
use pitchside_opendal::{DocumentStore, StoreConfig};
use pitchside_rig::{CompletionConfig, EmbeddingConfig, RigEmbedder, RigSummarizer, Summarizer};
use pitchside_vector::config::{MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION};
use pitchside_vector::search::DEFAULT_TOP_K;
use pitchside_vector::{
    Embedder, IdentifierStorage, IndexConfig, QdrantBackend, QdrantConfig, QueryApi,
    SearcherConfig, VectorBackend,
};
use serde::{Deserialize, Serialize};

use crate::service::VectorCollections;
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Whether startup lists Qdrant collections before serving.
    pub const SEARCH_SELF_TEST: bool = true;

    pub fn match_details_collection() -> String {
        super::MATCH_DETAILS_COLLECTION.to_owned()
    }

    pub fn match_stats_collection() -> String {
        super::MATCH_STATS_COLLECTION.to_owned()
    }

    pub fn search_top_k() -> usize {
        super::DEFAULT_TOP_K
    }

    pub fn search_self_test() -> bool {
        SEARCH_SELF_TEST
    }
}

/// Index layout and retrieval settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct IndexSettings {
    /// Storage convention for identifier payload fields.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ID_INDEX_TYPE", value_enum, default_value_t = IdentifierStorage::Integer)
    )]
    #[serde(default)]
    pub id_index_type: IdentifierStorage,

    /// Vector collection for match detail summaries.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MATCH_DETAILS_COLLECTION", default_value = MATCH_DETAILS_COLLECTION)
    )]
    #[serde(default = "defaults::match_details_collection")]
    pub match_details_collection: String,

    /// Vector collection for match statistics summaries.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "MATCH_STATS_COLLECTION", default_value = MATCH_STATS_COLLECTION)
    )]
    #[serde(default = "defaults::match_stats_collection")]
    pub match_stats_collection: String,

    /// Query call shape used by the searcher.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "QDRANT_QUERY_API", value_enum, default_value_t = QueryApi::Auto)
    )]
    #[serde(default)]
    pub qdrant_query_api: QueryApi,

    /// Hits returned per collection for a user question.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SEARCH_TOP_K", default_value_t = DEFAULT_TOP_K)
    )]
    #[serde(default = "defaults::search_top_k")]
    pub search_top_k: usize,

    /// Lists Qdrant collections at startup to surface credential problems early.
    #[cfg_attr(
        feature = "config",
        arg(
            long,
            env = "SEARCH_SELF_TEST",
            default_value_t = defaults::SEARCH_SELF_TEST,
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "defaults::search_self_test")]
    pub search_self_test: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            id_index_type: IdentifierStorage::default(),
            match_details_collection: defaults::match_details_collection(),
            match_stats_collection: defaults::match_stats_collection(),
            qdrant_query_api: QueryApi::default(),
            search_top_k: defaults::search_top_k(),
            search_self_test: defaults::search_self_test(),
        }
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Default, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Qdrant connection.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub qdrant: QdrantConfig,

    /// Embedding provider.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Completion model used for match summaries.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Upstream fixture feeds.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub feed: FeedConfig,

    /// Document store.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub store: StoreConfig,

    /// Index layout and retrieval.
    #[cfg_attr(feature = "config", command(flatten))]
    #[builder(default)]
    #[serde(default)]
    pub index: IndexSettings,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Validates every configuration group.
    pub fn validate(&self) -> Result<()> {
        self.qdrant.validate()?;
        self.embedding.validate()?;
        self.completion.validate()?;
        self.feed.validate()?;
        self.store.validate()?;
        self.index_config().validate()?;
        self.searcher_config().validate()?;
        Ok(())
    }

    /// Index layout: the cricket field lists under the configured names,
    /// sized to the embedding dimensionality.
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::cricket(
            &self.index.match_details_collection,
            &self.index.match_stats_collection,
        )
        .with_vector_dim(self.embedding.embedding_dim)
        .with_identifier_storage(self.index.id_index_type)
    }

    /// Searcher settings over both match collections.
    pub fn searcher_config(&self) -> SearcherConfig {
        SearcherConfig::new([
            &self.index.match_details_collection,
            &self.index.match_stats_collection,
        ])
        .with_top_k(self.index.search_top_k)
        .with_timeout(self.qdrant.timeout())
        .with_self_test(self.index.search_self_test)
        .with_query_api(self.index.qdrant_query_api)
    }

    /// Vector collections written by the embedding pipeline.
    pub fn vector_collections(&self) -> VectorCollections {
        VectorCollections {
            match_details: self.index.match_details_collection.clone(),
            match_stats: self.index.match_stats_collection.clone(),
        }
    }

    /// Connects to Qdrant.
    pub fn connect_qdrant(&self) -> Result<Arc<dyn VectorBackend>> {
        let backend = QdrantBackend::connect(self.qdrant.clone())?;
        Ok(Arc::new(backend))
    }

    /// Builds the configured embedding provider.
    pub fn connect_embedder(&self) -> Result<Arc<dyn Embedder>> {
        let embedder = RigEmbedder::connect(&self.embedding, self.completion.api_key())?;
        Ok(Arc::new(embedder))
    }

    /// Builds the completion-backed summarizer.
    ///
    /// Must be called inside a tokio runtime.
    pub fn connect_summarizer(&self) -> Result<Arc<dyn Summarizer>> {
        let summarizer = RigSummarizer::openai(&self.completion)?;
        Ok(Arc::new(summarizer))
    }

    /// Builds the fixture feed client.
    pub fn connect_feed(&self) -> Result<Arc<dyn FixtureSource>> {
        let client = FeedClient::new(self.feed.clone())?;
        Ok(Arc::new(client))
    }

    /// Opens the document store.
    pub fn open_store(&self) -> Result<DocumentStore> {
        DocumentStore::new(self.store.clone()).map_err(|e| {
            Error::internal("store", "Failed to open the document store").with_source(e)
        })
    }
}

impl ServiceConfigBuilder {
    /// Wrapper for builder validation that returns String errors.
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        if let Some(ref index) = builder.index {
            if index.match_details_collection.trim().is_empty()
                || index.match_stats_collection.trim().is_empty()
            {
                return Err("Vector collection names cannot be empty".to_string());
            }

            if index.match_details_collection == index.match_stats_collection {
                return Err("Match details and match stats collections must differ".to_string());
            }

            if index.search_top_k == 0 {
                return Err("Search top_k must be greater than zero".to_string());
            }
        }

        if let Some(ref embedding) = builder.embedding
            && embedding.embedding_dim == 0
        {
            return Err("Embedding dimension must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ServiceConfig::default();
        let index = config.index_config();

        assert_eq!(index.vector_dim, config.embedding.embedding_dim);
        assert_eq!(index.identifier_storage, IdentifierStorage::Integer);
        assert_eq!(
            index.collection_names().collect::<Vec<_>>(),
            vec![MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION]
        );

        let searcher = config.searcher_config();
        assert_eq!(searcher.top_k, DEFAULT_TOP_K);
        assert!(searcher.run_self_test);
        assert_eq!(searcher.timeout, config.qdrant.timeout());
    }

    #[test]
    fn test_renamed_collections_flow_everywhere() {
        let config = ServiceConfig {
            index: IndexSettings {
                id_index_type: IdentifierStorage::Keyword,
                match_details_collection: "details_v2".into(),
                match_stats_collection: "stats_v2".into(),
                ..IndexSettings::default()
            },
            ..ServiceConfig::default()
        };

        assert!(config.index_config().fields("details_v2").is_some());
        assert_eq!(config.searcher_config().collections, vec!["details_v2", "stats_v2"]);
        assert_eq!(config.vector_collections().match_stats, "stats_v2");
        assert_eq!(
            config.index_config().identifier_storage,
            IdentifierStorage::Keyword
        );
    }

    #[test]
    fn test_builder_rejects_duplicate_collections() {
        let result = ServiceConfig::builder()
            .with_index(IndexSettings {
                match_stats_collection: MATCH_DETAILS_COLLECTION.into(),
                ..IndexSettings::default()
            })
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = ServiceConfig::builder().build().unwrap();
        assert_eq!(config.index, IndexSettings::default());
    }
}
