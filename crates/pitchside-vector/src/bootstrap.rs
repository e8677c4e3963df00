//! Idempotent collection and payload-index bootstrap.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_BOOTSTRAP;
use crate::backend::VectorBackend;
use crate::config::IndexConfig;
use crate::schema::SchemaPlanner;

/// Outcome of a single [`CollectionBootstrapper::ensure`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    /// Collection the report describes.
    pub collection: String,
    /// Whether this call created the collection.
    pub created_collection: bool,
    /// Fields whose index was created by this call.
    pub created_indexes: Vec<String>,
    /// Fields whose index creation failed and was skipped.
    pub skipped_indexes: Vec<String>,
}

/// Ensures collections and their payload indexes exist.
///
/// Every failure is logged and absorbed; repeated calls converge on the
/// planned layout.
#[derive(Clone)]
pub struct CollectionBootstrapper {
    backend: Arc<dyn VectorBackend>,
    planner: SchemaPlanner,
}

impl CollectionBootstrapper {
    /// Creates a bootstrapper over the given backend and layout.
    pub fn new(backend: Arc<dyn VectorBackend>, config: IndexConfig) -> Self {
        Self {
            backend,
            planner: SchemaPlanner::new(config),
        }
    }

    /// Returns the schema planner.
    pub fn planner(&self) -> &SchemaPlanner {
        &self.planner
    }

    /// Ensures `collection` exists with every planned payload index.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_BOOTSTRAP, fields(collection = %collection))]
    pub async fn ensure(&self, collection: &str) -> BootstrapReport {
        let config = self.planner.config();
        let mut report = BootstrapReport {
            collection: collection.to_owned(),
            ..BootstrapReport::default()
        };

        let existing = match self.backend.collection_info(collection).await {
            Ok(info) => info.indexed_fields,
            Err(err) if err.is_not_found() => {
                match self
                    .backend
                    .create_collection(collection, config.vector_dim, config.distance)
                    .await
                {
                    Ok(()) => {
                        report.created_collection = true;
                        tracing::info!(
                            target: TRACING_TARGET_BOOTSTRAP,
                            collection,
                            vector_dim = config.vector_dim,
                            "Created collection"
                        );
                    }
                    Err(err) if err.is_already_exists() => {
                        tracing::debug!(
                            target: TRACING_TARGET_BOOTSTRAP,
                            collection,
                            "Collection created concurrently"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: TRACING_TARGET_BOOTSTRAP,
                            collection,
                            error = %err,
                            "Failed to create collection"
                        );
                    }
                }
                BTreeSet::new()
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_BOOTSTRAP,
                    collection,
                    error = %err,
                    "Failed to read collection info"
                );
                BTreeSet::new()
            }
        };

        for (field, schema) in self.planner.plan(collection) {
            if existing.contains(&field) {
                continue;
            }

            match self
                .backend
                .create_payload_index(collection, &field, schema)
                .await
            {
                Ok(()) => {
                    tracing::debug!(
                        target: TRACING_TARGET_BOOTSTRAP,
                        collection,
                        field = %field,
                        schema = %schema,
                        "Created payload index"
                    );
                    report.created_indexes.push(field);
                }
                Err(err) if err.is_already_exists() => {
                    tracing::debug!(
                        target: TRACING_TARGET_BOOTSTRAP,
                        collection,
                        field = %field,
                        "Payload index already exists"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_BOOTSTRAP,
                        collection,
                        field = %field,
                        error = %err,
                        "Failed to create payload index"
                    );
                    report.skipped_indexes.push(field);
                }
            }
        }

        report
    }

    /// Runs [`ensure`](Self::ensure) for every configured collection.
    pub async fn ensure_all(&self) -> Vec<BootstrapReport> {
        let mut reports = Vec::new();
        for collection in self.planner.config().collection_names() {
            reports.push(self.ensure(collection).await);
        }
        reports
    }
}

impl std::fmt::Debug for CollectionBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionBootstrapper")
            .field("planner", &self.planner)
            .finish_non_exhaustive()
    }
}
