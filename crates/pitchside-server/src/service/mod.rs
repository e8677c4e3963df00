//! Application state and dependency injection.

mod config;
mod pipeline;

use std::sync::Arc;

use pitchside_feed::FixtureSource;
use pitchside_opendal::DocumentStore;
use pitchside_rig::Summarizer;
use pitchside_vector::{
    CollectionBootstrapper, Embedder, IdentifierStorage, Searcher, Upserter, VectorBackend,
};

pub use crate::service::config::{IndexSettings, ServiceConfig, ServiceConfigBuilder};
pub use crate::service::pipeline::{
    IngestPipeline, MATCH_DESCRIPTIONS, MATCH_DETAILS, MATCH_DETAILS_SUMMARY, MATCH_STATS,
    MATCH_STATS_SUMMARY, MatchStoreStatus, StoreOutcome, TRACING_TARGET_PIPELINE,
    VectorCollections,
};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// External clients the state is assembled from.
///
/// [`ServiceConfig`] builds the production set; tests pass in-memory ones.
#[derive(Clone)]
pub struct ServiceClients {
    pub backend: Arc<dyn VectorBackend>,
    pub embedder: Arc<dyn Embedder>,
    pub summarizer: Arc<dyn Summarizer>,
    pub feed: Arc<dyn FixtureSource>,
    pub store: DocumentStore,
}

impl ServiceClients {
    /// Connects every external client described by `config`.
    pub fn connect(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            backend: config.connect_qdrant()?,
            embedder: config.connect_embedder()?,
            summarizer: config.connect_summarizer()?,
            feed: config.connect_feed()?,
            store: config.open_store()?,
        })
    }
}

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub feed: Arc<dyn FixtureSource>,
    pub store: DocumentStore,

    // Internal services:
    pub searcher: Searcher,
    pub pipeline: IngestPipeline,
    pub identifier_storage: IdentifierStorage,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to all external services and runs the searcher self-test.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        service_config.validate()?;
        let clients = ServiceClients::connect(service_config)?;
        Self::new(service_config, clients).await
    }

    /// Assembles state from already connected clients.
    ///
    /// A self-test rejected for credentials fails with an auth error.
    pub async fn new(service_config: &ServiceConfig, clients: ServiceClients) -> Result<Self> {
        let index_config = service_config.index_config();
        let identifier_storage = index_config.identifier_storage;

        let bootstrapper = CollectionBootstrapper::new(clients.backend.clone(), index_config);
        let upserter = Upserter::new(
            clients.backend.clone(),
            clients.embedder.clone(),
            bootstrapper.clone(),
        );

        let searcher = Searcher::connect(
            clients.backend,
            clients.embedder,
            service_config.searcher_config(),
        )
        .await?;

        let pipeline = IngestPipeline::new(
            clients.feed.clone(),
            clients.store.clone(),
            clients.summarizer,
            bootstrapper,
            upserter,
            service_config.vector_collections(),
        );

        Ok(Self {
            feed: clients.feed,
            store: clients.store,
            searcher,
            pipeline,
            identifier_storage,
        })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

// External services:
impl_di!(feed: Arc<dyn FixtureSource>);
impl_di!(store: DocumentStore);

// Internal services:
impl_di!(searcher: Searcher);
impl_di!(pipeline: IngestPipeline);
impl_di!(identifier_storage: IdentifierStorage);
