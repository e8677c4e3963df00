//! Scripted fixture source for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pitchside_vector::MatchKey;
use tokio::sync::RwLock;

use crate::source::FixtureSource;
use crate::types::{Fixture, MatchSections};
use crate::{FeedError, FeedResult};

#[derive(Default)]
struct ScriptedFeed {
    fixtures: Vec<Fixture>,
    sections: HashMap<String, MatchSections>,
    unavailable: bool,
}

/// In-memory [`FixtureSource`] returning scripted data.
#[derive(Clone, Default)]
pub struct StaticFixtureSource {
    feed: Arc<RwLock<ScriptedFeed>>,
}

impl StaticFixtureSource {
    /// Creates a source publishing `fixtures`.
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        Self {
            feed: Arc::new(RwLock::new(ScriptedFeed {
                fixtures,
                ..ScriptedFeed::default()
            })),
        }
    }

    /// Sets the sections returned for `key`.
    pub async fn set_sections(&self, key: impl Into<MatchKey>, sections: MatchSections) {
        self.feed
            .write()
            .await
            .sections
            .insert(key.into().to_string(), sections);
    }

    /// Makes the fixture list fail until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.feed.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl FixtureSource for StaticFixtureSource {
    async fn upcoming_fixtures(&self) -> FeedResult<Vec<Fixture>> {
        let feed = self.feed.read().await;
        if feed.unavailable {
            return Err(FeedError::unavailable("scripted outage"));
        }
        Ok(feed.fixtures.clone())
    }

    async fn match_sections(&self, fixture: &Fixture) -> MatchSections {
        self.feed
            .read()
            .await
            .sections
            .get(&fixture.season_game_uid.to_string())
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for StaticFixtureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFixtureSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_scripted_sections_match_by_canonical_key() {
        let source = StaticFixtureSource::new(vec![Fixture::new(7)]);
        source
            .set_sections(
                "7",
                MatchSections {
                    venue: Some(json!({ "venue_id": 3 })),
                    ..MatchSections::default()
                },
            )
            .await;

        let fixtures = source.upcoming_fixtures().await.unwrap();
        let sections = source.match_sections(&fixtures[0]).await;
        assert_eq!(sections.venue, Some(json!({ "venue_id": 3 })));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let source = StaticFixtureSource::default();
        source.set_unavailable(true).await;
        assert!(source.upcoming_fixtures().await.is_err());

        source.set_unavailable(false).await;
        assert!(source.upcoming_fixtures().await.unwrap().is_empty());
    }
}
