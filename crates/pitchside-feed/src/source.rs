//! Fixture source abstraction.

use async_trait::async_trait;

use crate::FeedResult;
use crate::types::{Fixture, MatchSections};

/// Provider of upcoming fixtures and their auxiliary match data.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    /// Fetches the upcoming fixture list.
    async fn upcoming_fixtures(&self) -> FeedResult<Vec<Fixture>>;

    /// Fetches every auxiliary section for `fixture`.
    ///
    /// Never fails: a section that cannot be fetched is `None`.
    async fn match_sections(&self, fixture: &Fixture) -> MatchSections;
}
