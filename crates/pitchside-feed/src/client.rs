//! Reqwest-based client for the fixture feeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use strum::IntoEnumIterator;
use url::Url;

use crate::TRACING_TARGET_CLIENT;
use crate::config::FeedConfig;
use crate::source::FixtureSource;
use crate::types::{FeedSection, Fixture, MatchSections, SectionRequest, section_data};
use crate::{FeedError, FeedResult};

struct FeedClientInner {
    http: Client,
    config: FeedConfig,
    source_url: Url,
    section_urls: BTreeMap<FeedSection, Url>,
}

/// HTTP client for the upstream fixture list and auxiliary feeds.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct FeedClient {
    inner: Arc<FeedClientInner>,
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl FeedClient {
    /// Creates a client from validated configuration.
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        let source_url = config.parsed_source_url()?;
        let mut section_urls = BTreeMap::new();
        for feed in FeedSection::iter() {
            if let Some(url) = config.parsed_section_url(feed)? {
                section_urls.insert(feed, url);
            }
        }

        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("pitchside/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            source_url = %source_url,
            sections = section_urls.len(),
            timeout_secs = timeout.as_secs(),
            "Feed client created"
        );

        Ok(Self {
            inner: Arc::new(FeedClientInner {
                http,
                config,
                source_url,
                section_urls,
            }),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    async fn fetch_section(
        &self,
        feed: FeedSection,
        url: &Url,
        fixture: &Fixture,
    ) -> FeedResult<Option<Value>> {
        let body: Value = self
            .inner
            .http
            .post(url.clone())
            .json(&SectionRequest::new(fixture))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let data = section_data(body);
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            section = %feed,
            match_id = %fixture.season_game_uid,
            present = data.is_some(),
            "Fetched match section"
        );
        Ok(data)
    }
}

#[async_trait]
impl FixtureSource for FeedClient {
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CLIENT)]
    async fn upcoming_fixtures(&self) -> FeedResult<Vec<Fixture>> {
        let body: Value = self
            .inner
            .http
            .get(self.inner.source_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let fixtures = parse_fixtures(body)?;
        tracing::info!(
            target: TRACING_TARGET_CLIENT,
            count = fixtures.len(),
            "Fetched upcoming fixtures"
        );
        Ok(fixtures)
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_CLIENT, fields(match_id = %fixture.season_game_uid))]
    async fn match_sections(&self, fixture: &Fixture) -> MatchSections {
        let mut sections = MatchSections::default();

        for feed in FeedSection::iter() {
            let Some(url) = self.inner.section_urls.get(&feed) else {
                tracing::debug!(
                    target: TRACING_TARGET_CLIENT,
                    section = %feed,
                    "Section feed not configured"
                );
                continue;
            };

            match self.fetch_section(feed, url, fixture).await {
                Ok(data) => sections.set(feed, data),
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET_CLIENT,
                        section = %feed,
                        url = %url,
                        error = %err,
                        "Section feed failed"
                    );
                }
            }
        }

        sections
    }
}

/// Parses the fixture list body.
///
/// Accepts a bare array or an object with a `data` array. Entries without a
/// usable `season_game_uid` are dropped.
fn parse_fixtures(body: Value) -> FeedResult<Vec<Fixture>> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(FeedError::payload("expected a fixture array")),
        },
        Value::Null => Vec::new(),
        _ => return Err(FeedError::payload("expected a fixture array")),
    };

    let fixtures = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Fixture>(entry) {
            Ok(fixture) => Some(fixture),
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_CLIENT,
                    error = %err,
                    "Skipping malformed fixture"
                );
                None
            }
        })
        .collect();

    Ok(fixtures)
}
