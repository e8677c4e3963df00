//! Scheduled ingestion handlers.
//!
//! These endpoints are hit by an external scheduler. The list endpoint only
//! reads the feed; the cron endpoint enriches and stores every upcoming
//! fixture; the embedding endpoint indexes what the cron endpoint stored.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use pitchside_feed::{Fixture, FixtureSource, FixtureSummary};
use pitchside_vector::IndexReport;

use crate::extract::Json;
use crate::handler::Result;
use crate::handler::response::ApiEnvelope;
use crate::service::{IngestPipeline, MatchStoreStatus, ServiceState};

/// Tracing target for cron operations.
const TRACING_TARGET: &str = "pitchside_server::handler::cron";

const NO_UPCOMING_MATCHES: &str = "No upcoming matches found.";

/// Fetches upcoming fixtures; `None` when the feed has none.
async fn upcoming_fixtures(feed: &dyn FixtureSource) -> Result<Option<Vec<Fixture>>> {
    let fixtures = feed.upcoming_fixtures().await?;

    if fixtures.is_empty() {
        tracing::info!(target: TRACING_TARGET, "Feed returned no upcoming fixtures");
        return Ok(None);
    }

    tracing::debug!(
        target: TRACING_TARGET,
        fixtures = fixtures.len(),
        "Fetched upcoming fixtures"
    );

    Ok(Some(fixtures))
}

fn no_upcoming_matches() -> Response {
    Json(ApiEnvelope::empty(NO_UPCOMING_MATCHES)).into_response()
}

/// Lists upcoming fixtures.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn upcoming_matches_list(
    State(feed): State<Arc<dyn FixtureSource>>,
) -> Result<Response> {
    let Some(fixtures) = upcoming_fixtures(feed.as_ref()).await? else {
        return Ok(no_upcoming_matches());
    };

    let summaries: Vec<FixtureSummary> = fixtures.iter().map(Fixture::summary).collect();
    let envelope = ApiEnvelope::ok("Upcoming matches fetched successfully.", summaries);

    Ok(Json(envelope).into_response())
}

/// Enriches, summarizes and stores every upcoming fixture.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn upcoming_matches_cron(
    State(feed): State<Arc<dyn FixtureSource>>,
    State(pipeline): State<IngestPipeline>,
) -> Result<Response> {
    let Some(fixtures) = upcoming_fixtures(feed.as_ref()).await? else {
        return Ok(no_upcoming_matches());
    };

    let statuses: Vec<MatchStoreStatus> = pipeline.enrich(&fixtures).await;

    tracing::info!(
        target: TRACING_TARGET,
        matches = statuses.len(),
        "Upcoming matches stored"
    );

    let envelope = ApiEnvelope::ok("Upcoming matches stored successfully.", statuses);
    Ok(Json(envelope).into_response())
}

/// Indexes the stored summaries of every upcoming fixture.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn upcoming_matches_embedding(
    State(feed): State<Arc<dyn FixtureSource>>,
    State(pipeline): State<IngestPipeline>,
) -> Result<Response> {
    let Some(fixtures) = upcoming_fixtures(feed.as_ref()).await? else {
        return Ok(no_upcoming_matches());
    };

    let reports: BTreeMap<String, IndexReport> = pipeline.embed(&fixtures).await;

    tracing::info!(
        target: TRACING_TARGET,
        reports = ?reports,
        "Upcoming matches indexed"
    );

    let envelope = ApiEnvelope::ok("Upcoming matches indexed successfully.", reports);
    Ok(Json(envelope).into_response())
}

/// Returns a [`Router`] with all cron routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/cron/get_upcoming_matches_list", get(upcoming_matches_list))
        .route("/cron/get_upcoming_matches_cron", get(upcoming_matches_cron))
        .route(
            "/cron/get_upcoming_matches_embeding",
            get(upcoming_matches_embedding),
        )
}
