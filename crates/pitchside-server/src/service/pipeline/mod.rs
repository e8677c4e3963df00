//! Fixture ingestion: enrichment into the document store, then indexing.
//!
//! [`IngestPipeline::enrich`] pulls the auxiliary feeds for every fixture,
//! summarizes the assembled records and stores them. [`IngestPipeline::embed`]
//! reads those records back and pushes their summaries into the vector store.
//! Both run fixtures one at a time and never fail as a whole.

mod documents;
mod record;

use std::collections::BTreeMap;
use std::sync::Arc;

use pitchside_feed::{Fixture, FixtureSource};
use pitchside_opendal::{DocumentStore, Record, UpsertStatus};
use pitchside_rig::Summarizer;
use pitchside_vector::{CollectionBootstrapper, Document, IndexReport, Upserter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display};

pub use self::documents::{build_document, coerce_identifiers};
pub use self::record::{match_details, match_stats};

/// Tracing target for the ingestion pipeline.
pub const TRACING_TARGET_PIPELINE: &str = "pitchside_server::pipeline";

/// Store collection and style guide key for match details.
pub const MATCH_DETAILS: &str = "match_details";

/// Store collection and style guide key for match statistics.
pub const MATCH_STATS: &str = "match_stats";

/// Store collection holding summary style guides.
pub const MATCH_DESCRIPTIONS: &str = "match_descriptions";

/// Record field holding the details summary.
pub const MATCH_DETAILS_SUMMARY: &str = "match_details_summary";

/// Record field holding the statistics summary.
pub const MATCH_STATS_SUMMARY: &str = "match_stats_summary";

/// Vector collections the two record kinds are indexed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorCollections {
    /// Collection for match detail summaries.
    pub match_details: String,
    /// Collection for match statistics summaries.
    pub match_stats: String,
}

impl Default for VectorCollections {
    fn default() -> Self {
        Self {
            match_details: pitchside_vector::config::MATCH_DETAILS_COLLECTION.to_owned(),
            match_stats: pitchside_vector::config::MATCH_STATS_COLLECTION.to_owned(),
        }
    }
}

/// Outcome of storing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreOutcome {
    Inserted,
    Updated,
    Error,
}

impl From<UpsertStatus> for StoreOutcome {
    fn from(status: UpsertStatus) -> Self {
        match status {
            UpsertStatus::Inserted => Self::Inserted,
            UpsertStatus::Updated => Self::Updated,
        }
    }
}

/// Per-fixture result of [`IngestPipeline::enrich`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStoreStatus {
    /// Canonical match identifier.
    pub match_id: String,
    pub match_details: StoreOutcome,
    pub match_stats: StoreOutcome,
}

/// Enrichment and indexing over shared service handles.
#[derive(Clone)]
pub struct IngestPipeline {
    feed: Arc<dyn FixtureSource>,
    store: DocumentStore,
    summarizer: Arc<dyn Summarizer>,
    bootstrapper: CollectionBootstrapper,
    upserter: Upserter,
    collections: VectorCollections,
}

impl IngestPipeline {
    /// Creates a pipeline.
    pub fn new(
        feed: Arc<dyn FixtureSource>,
        store: DocumentStore,
        summarizer: Arc<dyn Summarizer>,
        bootstrapper: CollectionBootstrapper,
        upserter: Upserter,
        collections: VectorCollections,
    ) -> Self {
        Self {
            feed,
            store,
            summarizer,
            bootstrapper,
            upserter,
            collections,
        }
    }

    /// Returns the vector collections written by [`embed`](Self::embed).
    pub fn collections(&self) -> &VectorCollections {
        &self.collections
    }

    /// Enriches, summarizes and stores every fixture.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_PIPELINE, fields(fixtures = fixtures.len()))]
    pub async fn enrich(&self, fixtures: &[Fixture]) -> Vec<MatchStoreStatus> {
        let details_guide = self.style_guide(MATCH_DETAILS).await;
        let stats_guide = self.style_guide(MATCH_STATS).await;

        let mut statuses = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            let match_id = fixture.match_key().to_string();
            let sections = self.feed.match_sections(fixture).await;

            tracing::debug!(
                target: TRACING_TARGET_PIPELINE,
                match_id = %match_id,
                sections = sections.len(),
                "Fetched match sections"
            );

            let details = self
                .summarize_and_store(
                    &match_id,
                    MATCH_DETAILS,
                    MATCH_DETAILS_SUMMARY,
                    match_details(fixture, &sections),
                    &details_guide,
                )
                .await;
            let stats = self
                .summarize_and_store(
                    &match_id,
                    MATCH_STATS,
                    MATCH_STATS_SUMMARY,
                    match_stats(fixture, &sections),
                    &stats_guide,
                )
                .await;

            statuses.push(MatchStoreStatus {
                match_id,
                match_details: details,
                match_stats: stats,
            });
        }

        let failed = statuses
            .iter()
            .filter(|s| s.match_details == StoreOutcome::Error || s.match_stats == StoreOutcome::Error)
            .count();
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            matches = statuses.len(),
            failed,
            "Enrichment finished"
        );

        statuses
    }

    /// Indexes the stored summaries of every fixture.
    ///
    /// Reports are keyed by vector collection name.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_PIPELINE, fields(fixtures = fixtures.len()))]
    pub async fn embed(&self, fixtures: &[Fixture]) -> BTreeMap<String, IndexReport> {
        let planner = self.bootstrapper.planner();
        let mut details_docs = Vec::new();
        let mut stats_docs = Vec::new();

        for fixture in fixtures {
            let match_id = fixture.match_key().to_string();
            let targets = [
                (MATCH_DETAILS, MATCH_DETAILS_SUMMARY, &mut details_docs),
                (MATCH_STATS, MATCH_STATS_SUMMARY, &mut stats_docs),
            ];

            for (store_collection, summary_field, documents) in targets {
                let Some(record) = self.stored_record(store_collection, &match_id).await else {
                    continue;
                };

                match build_document(&record, summary_field, planner) {
                    Some(document) => documents.push(document),
                    None => tracing::debug!(
                        target: TRACING_TARGET_PIPELINE,
                        match_id = %match_id,
                        collection = store_collection,
                        "Stored record has no summary"
                    ),
                }
            }
        }

        let mut reports = BTreeMap::new();
        let batches = [
            (self.collections.match_details.as_str(), details_docs),
            (self.collections.match_stats.as_str(), stats_docs),
        ];
        for (collection, documents) in batches {
            reports.insert(collection.to_owned(), self.index(collection, &documents).await);
        }

        reports
    }

    async fn index(&self, collection: &str, documents: &[Document]) -> IndexReport {
        let bootstrap = self.bootstrapper.ensure(collection).await;
        tracing::debug!(
            target: TRACING_TARGET_PIPELINE,
            collection,
            report = ?bootstrap,
            "Collection ensured"
        );

        let report = self.upserter.push(documents, collection).await;
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            collection,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Collection indexed"
        );
        report
    }

    /// Loads a style guide; missing or unreadable guides are the empty object.
    async fn style_guide(&self, description_type: &str) -> Value {
        match self.store.get_by_key(MATCH_DESCRIPTIONS, description_type).await {
            Ok(Some(guide)) => Value::Object(guide),
            Ok(None) => {
                tracing::debug!(
                    target: TRACING_TARGET_PIPELINE,
                    description_type,
                    "No style guide stored"
                );
                Value::Object(Record::new())
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_PIPELINE,
                    description_type,
                    error = %err,
                    "Failed to read style guide"
                );
                Value::Object(Record::new())
            }
        }
    }

    async fn stored_record(&self, collection: &str, match_id: &str) -> Option<Record> {
        match self.store.get_by_key(collection, match_id).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_PIPELINE,
                    collection,
                    match_id,
                    error = %err,
                    "Failed to read stored record"
                );
                None
            }
        }
    }

    async fn summarize_and_store(
        &self,
        match_id: &str,
        collection: &str,
        summary_field: &str,
        mut record: Record,
        style_guide: &Value,
    ) -> StoreOutcome {
        let input = Value::Object(record.clone());
        let summary = match self.summarizer.summarize(&input, style_guide).await {
            Ok(summary) => summary,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_PIPELINE,
                    match_id,
                    collection,
                    error = %err,
                    "Summary failed, record not stored"
                );
                return StoreOutcome::Error;
            }
        };
        record.insert(summary_field.to_owned(), Value::String(summary));

        match self.store.upsert_by_key(collection, match_id, record).await {
            Ok(status) => status.into(),
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_PIPELINE,
                    match_id,
                    collection,
                    error = %err,
                    "Failed to store record"
                );
                StoreOutcome::Error
            }
        }
    }
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("store", &self.store)
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}
