//! Fixture and match-section payloads.

use pitchside_vector::MatchKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter};

/// Sport identifier the auxiliary feeds expect for cricket.
pub const SPORTS_ID_CRICKET: &str = "7";

/// Upcoming fixture as published by the source feed.
///
/// Only the match identifier is required. Every other field is carried as the
/// feed sent it, since upstream types vary between leagues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// Upstream match identifier.
    pub season_game_uid: MatchKey,
    #[serde(default)]
    pub league_id: Value,
    #[serde(default)]
    pub league_name: Value,
    /// Home team short name.
    #[serde(default)]
    pub home: Value,
    /// Away team short name.
    #[serde(default)]
    pub away: Value,
    /// Match format (T20, ODI, TEST, ...).
    #[serde(default)]
    pub format: Value,
    #[serde(default)]
    pub season_scheduled_date: Value,
    /// Whether the playing eleven has been announced.
    #[serde(default)]
    pub playing_announce: Value,
}

impl Fixture {
    /// Creates a fixture with only the identifier set.
    pub fn new(season_game_uid: impl Into<MatchKey>) -> Self {
        Self {
            season_game_uid: season_game_uid.into(),
            league_id: Value::Null,
            league_name: Value::Null,
            home: Value::Null,
            away: Value::Null,
            format: Value::Null,
            season_scheduled_date: Value::Null,
            playing_announce: Value::Null,
        }
    }

    /// Returns the match key.
    pub fn match_key(&self) -> &MatchKey {
        &self.season_game_uid
    }

    /// Returns the list-endpoint view of this fixture.
    pub fn summary(&self) -> FixtureSummary {
        FixtureSummary::from(self)
    }
}

/// Fixture fields renamed to the service vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSummary {
    pub match_id: MatchKey,
    pub league_id: Value,
    pub league_name: Value,
    pub home_team: Value,
    pub away_team: Value,
    pub match_format: Value,
    pub match_scheduled_date: Value,
    pub lineup_announce: Value,
}

impl From<&Fixture> for FixtureSummary {
    fn from(fixture: &Fixture) -> Self {
        Self {
            match_id: fixture.season_game_uid.clone(),
            league_id: fixture.league_id.clone(),
            league_name: fixture.league_name.clone(),
            home_team: fixture.home.clone(),
            away_team: fixture.away.clone(),
            match_format: fixture.format.clone(),
            match_scheduled_date: fixture.season_scheduled_date.clone(),
            lineup_announce: fixture.playing_announce.clone(),
        }
    }
}

/// Auxiliary feed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter
)]
#[strum(serialize_all = "snake_case")]
pub enum FeedSection {
    Venue,
    Statistics,
    Predictions,
    Squads,
}

/// Auxiliary data for one fixture, one optional section per feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSections {
    pub venue: Option<Value>,
    pub statistics: Option<Value>,
    pub predictions: Option<Value>,
    pub squads: Option<Value>,
}

impl MatchSections {
    /// Returns the section for `feed`.
    pub fn get(&self, feed: FeedSection) -> Option<&Value> {
        match feed {
            FeedSection::Venue => self.venue.as_ref(),
            FeedSection::Statistics => self.statistics.as_ref(),
            FeedSection::Predictions => self.predictions.as_ref(),
            FeedSection::Squads => self.squads.as_ref(),
        }
    }

    /// Sets the section for `feed`.
    pub fn set(&mut self, feed: FeedSection, data: Option<Value>) {
        let slot = match feed {
            FeedSection::Venue => &mut self.venue,
            FeedSection::Statistics => &mut self.statistics,
            FeedSection::Predictions => &mut self.predictions,
            FeedSection::Squads => &mut self.squads,
        };
        *slot = data;
    }

    /// Returns the number of sections present.
    pub fn len(&self) -> usize {
        [
            &self.venue,
            &self.statistics,
            &self.predictions,
            &self.squads,
        ]
        .into_iter()
        .filter(|section| section.is_some())
        .count()
    }

    /// Returns true if no section is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Body of an auxiliary feed request.
#[derive(Debug, Serialize)]
pub(crate) struct SectionRequest<'a> {
    pub sports_id: &'static str,
    pub season_game_uid: &'a MatchKey,
    pub league_id: &'a Value,
}

impl<'a> SectionRequest<'a> {
    pub fn new(fixture: &'a Fixture) -> Self {
        Self {
            sports_id: SPORTS_ID_CRICKET,
            season_game_uid: &fixture.season_game_uid,
            league_id: &fixture.league_id,
        }
    }
}

/// Extracts the `data` member of an auxiliary response.
///
/// Null, `false` and empty strings, arrays or objects count as absent.
pub(crate) fn section_data(mut body: Value) -> Option<Value> {
    let data = body.get_mut("data").map(Value::take)?;
    let present = match &data {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        _ => true,
    };
    present.then_some(data)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fixture_tolerates_missing_fields() {
        let fixture: Fixture = serde_json::from_value(json!({
            "season_game_uid": "91916",
            "home": "IND",
        }))
        .unwrap();

        assert_eq!(fixture.match_key(), &MatchKey::from("91916"));
        assert_eq!(fixture.home, json!("IND"));
        assert!(fixture.away.is_null());
    }

    #[test]
    fn test_summary_renames_fields() {
        let fixture: Fixture = serde_json::from_value(json!({
            "season_game_uid": 91916,
            "league_id": 12,
            "league_name": "Asia Cup",
            "home": "IND",
            "away": "PAK",
            "format": "T20",
            "season_scheduled_date": "2025-09-14 14:30:00",
            "playing_announce": "1",
        }))
        .unwrap();

        let summary = serde_json::to_value(fixture.summary()).unwrap();
        assert_eq!(summary["match_id"], json!(91916));
        assert_eq!(summary["home_team"], json!("IND"));
        assert_eq!(summary["match_format"], json!("T20"));
        assert_eq!(summary["lineup_announce"], json!("1"));
    }

    #[test]
    fn test_section_request_body() {
        let mut fixture = Fixture::new(91916);
        fixture.league_id = json!(12);

        let body = serde_json::to_value(SectionRequest::new(&fixture)).unwrap();
        assert_eq!(
            body,
            json!({ "sports_id": "7", "season_game_uid": 91916, "league_id": 12 })
        );
    }

    #[test]
    fn test_section_data() {
        assert_eq!(
            section_data(json!({ "data": { "ground_name": "Dubai" } })),
            Some(json!({ "ground_name": "Dubai" }))
        );
        assert_eq!(section_data(json!({ "data": [] })), None);
        assert_eq!(section_data(json!({ "data": null })), None);
        assert_eq!(section_data(json!({ "error": "boom" })), None);
    }

    #[test]
    fn test_sections_accessors() {
        let mut sections = MatchSections::default();
        assert!(sections.is_empty());

        sections.set(FeedSection::Squads, Some(json!([1, 2])));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections.get(FeedSection::Squads), Some(&json!([1, 2])));
        assert_eq!(FeedSection::Predictions.to_string(), "predictions");
    }
}
