//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use pitchside_server::handler::routes;
//! use pitchside_server::service::{ServiceConfig, ServiceState};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::default();
//! let state = ServiceState::from_config(&config).await?;
//!
//! let app: axum::Router = routes().with_state(state);
//! # Ok(())
//! # }
//! ```
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod admin;
mod cron;
mod error;
mod monitors;
pub mod request;
pub mod response;
mod user;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes and a not-found fallback.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(cron::routes())
        .merge(admin::routes())
        .merge(user::routes())
        .merge(monitors::routes())
        .fallback(handler)
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use axum::Router;
    use axum_test::TestServer;
    use pitchside_feed::{Fixture, MatchSections, StaticFixtureSource};
    use pitchside_opendal::{DocumentStore, StoreConfig};
    use pitchside_rig::mock::MockSummarizer;
    use pitchside_vector::backend::MemoryBackend;
    use pitchside_vector::mock::MockEmbedder;
    use serde_json::{Value, json};

    use crate::handler::routes;
    use crate::service::{ServiceClients, ServiceConfig, ServiceState};

    /// Builds a fixture with the fields the list endpoint reports.
    pub fn sample_fixture(match_id: i64) -> Fixture {
        let mut fixture = Fixture::new(match_id);
        fixture.league_id = json!(5);
        fixture.league_name = json!("Asia Cup");
        fixture.home = json!("IND");
        fixture.away = json!("PAK");
        fixture.format = json!("T20");
        fixture.season_scheduled_date = json!("2025-09-14 14:30:00");
        fixture.playing_announce = json!("No");
        fixture
    }

    /// Sections with a venue and both squads.
    pub fn sample_sections() -> MatchSections {
        MatchSections {
            venue: Some(json!({
                "ground_name": "Eden Gardens",
                "venue_id": 12,
                "subtitle": "Match 6",
                "home_uid": 3,
                "away_uid": 4,
                "home_team": "India",
                "away_team": "Pakistan"
            })),
            statistics: Some(json!({
                "weather": { "temperature": 31 }
            })),
            predictions: None,
            squads: Some(json!([
                { "team_uid": 3, "player_uid": 101, "full_name": "Rohit Sharma", "position": "BAT" },
                { "team_uid": 4, "player_uid": 201, "full_name": "Babar Azam", "position": "BAT" }
            ])),
        }
    }

    /// In-memory service state plus handles to every fake behind it.
    pub struct TestContext {
        pub backend: MemoryBackend,
        pub feed: StaticFixtureSource,
        pub summarizer: MockSummarizer,
        pub store: DocumentStore,
        pub state: ServiceState,
    }

    impl TestContext {
        /// Creates a context whose feed publishes `fixtures`.
        pub async fn new(fixtures: Vec<Fixture>) -> anyhow::Result<Self> {
            Self::builder().with_fixtures(fixtures).build().await
        }

        pub fn builder() -> TestContextBuilder {
            TestContextBuilder::default()
        }

        /// Returns a new [`TestServer`] with the given router.
        pub fn server_with_router(
            &self,
            router: Router<ServiceState>,
        ) -> anyhow::Result<TestServer> {
            create_test_server_with_state(router, self.state.clone())
        }
    }

    #[derive(Default)]
    pub struct TestContextBuilder {
        fixtures: Vec<Fixture>,
        failing_for: Vec<Value>,
    }

    impl TestContextBuilder {
        pub fn with_fixtures(mut self, fixtures: Vec<Fixture>) -> Self {
            self.fixtures = fixtures;
            self
        }

        pub fn with_summarizer_failing_for(mut self, match_id: impl Into<Value>) -> Self {
            self.failing_for.push(match_id.into());
            self
        }

        pub async fn build(self) -> anyhow::Result<TestContext> {
            let config = ServiceConfig::default();

            let backend = MemoryBackend::new();
            let feed = StaticFixtureSource::new(self.fixtures);
            let summarizer = self
                .failing_for
                .into_iter()
                .fold(MockSummarizer::new(), |summarizer, match_id| {
                    summarizer.failing_for(match_id)
                });
            let store = DocumentStore::new(StoreConfig::memory())?;

            let clients = ServiceClients {
                backend: Arc::new(backend.clone()),
                embedder: Arc::new(MockEmbedder::new(config.embedding.embedding_dim)),
                summarizer: Arc::new(summarizer.clone()),
                feed: Arc::new(feed.clone()),
                store: store.clone(),
            };
            let state = ServiceState::new(&config, clients).await?;

            Ok(TestContext {
                backend,
                feed,
                summarizer,
                store,
                state,
            })
        }
    }

    /// Returns a new [`TestServer`] with the given router and state.
    pub fn create_test_server_with_state(
        router: Router<ServiceState>,
        state: ServiceState,
    ) -> anyhow::Result<TestServer> {
        let app = router.with_state(state);
        let server = TestServer::new(app)?;
        Ok(server)
    }

    /// Returns a new [`TestServer`] with the default router and state.
    pub async fn create_test_server() -> anyhow::Result<TestServer> {
        let context = TestContext::new(Vec::new()).await?;
        context.server_with_router(routes())
    }

    #[tokio::test]
    async fn handlers() -> anyhow::Result<()> {
        let server = create_test_server().await?;
        assert!(server.is_running());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() -> anyhow::Result<()> {
        let server = create_test_server().await?;

        let response = server.get("/cron/unknown").await;
        response.assert_status_not_found();

        let body = response.json::<Value>();
        assert_eq!(body["status"], json!("not_found"));
        Ok(())
    }

    #[tokio::test]
    async fn summarizer_sees_stored_style_guide() -> anyhow::Result<()> {
        let context = TestContext::new(vec![sample_fixture(7)]).await?;
        let server = context.server_with_router(routes())?;

        server
            .post("/admin/add_update_match_description")
            .json(&json!({
                "description_type": "match_details",
                "description_data": { "tone": "formal" }
            }))
            .await
            .assert_status_ok();
        server
            .get("/cron/get_upcoming_matches_cron")
            .await
            .assert_status_ok();

        let calls = context.summarizer.calls().await;
        assert_eq!(calls.len(), 2);
        let guides: Vec<&Value> = calls.iter().map(|(_, guide)| guide).collect();
        assert!(guides.iter().any(|guide| guide["tone"] == json!("formal")));
        assert!(guides.iter().any(|guide| guide.as_object().is_some_and(|g| g.is_empty())));

        Ok(())
    }
}
