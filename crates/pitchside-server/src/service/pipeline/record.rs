//! Assembly of the stored match records from a fixture and its sections.
//!
//! Both records start from the fixture fields and the venue identity. The
//! details record adds both squads; the stats record flattens the statistics
//! and predictions feeds into named fields the summarizer can read.

use pitchside_feed::{Fixture, MatchSections};
use pitchside_opendal::Record;
use pitchside_vector::MatchKey;
use serde_json::{Map, Value};

/// Venue feed key to record key.
const VENUE_FIELDS: &[(&str, &str)] = &[
    ("ground_name", "ground_name"),
    ("venue_id", "venue_id"),
    ("subtitle", "match_title"),
    ("home_uid", "home_team_id"),
    ("away_uid", "away_team_id"),
    ("home_team", "home_team_name"),
    ("away_team", "away_team_name"),
];

/// Squad feed key to player entry key.
const PLAYER_FIELDS: &[(&str, &str)] = &[
    ("team_uid", "team_id"),
    ("player_uid", "player_id"),
    ("full_name", "full_name"),
    ("nick_name", "nick_name"),
    ("position", "position"),
    ("last_match_played", "last_match_played"),
];

/// Statistics feed groups, each mapping nested keys to record keys.
const STATISTICS_GROUPS: &[(&str, &[(&str, &str)])] = &[
    (
        "toss_trend",
        &[
            ("bat_first_win", "bat_first_win_on_this_venue"),
            ("bat_second_win", "bat_second_win_on_this_venue"),
            ("total_matches", "total_matches_played_on_this_venue"),
        ],
    ),
    (
        "statement_tip",
        &[
            ("bat_type", "pitch_support_type"),
            ("bow_type", "bowling_support_type"),
        ],
    ),
    (
        "recent_matches_stats",
        &[
            ("avg_first_score", "avg_first_inning_score"),
            ("avg_second_score", "avg_second_inning_score"),
            ("avg_first_wicket", "avg_first_inning_wicket"),
            ("avg_second_wicket", "avg_second_inning_wicket"),
        ],
    ),
    (
        "venue_pitch_report",
        &[
            ("pitch_support", "pitch_support_description"),
            ("bowling_support", "bowling_support_description"),
            ("weather_report", "weather_report_description"),
        ],
    ),
    (
        "weather",
        &[
            ("temp", "temperature"),
            ("clouds", "clouds"),
            ("weather", "weather"),
            ("humidity", "humidity"),
            ("visibility", "visibility"),
            ("wind_speed", "wind_speed"),
            ("weather_desc", "weather_desc"),
        ],
    ),
];

/// Win margin keys copied under a `win_team_` prefix.
const WIN_MARGIN_FIELDS: &[(&str, &str)] = &[
    ("win_probability", "win_team_win_probability"),
    ("run", "win_team_run"),
    ("wicket", "win_team_wicket"),
];

/// Builds the `match_details` record.
pub fn match_details(fixture: &Fixture, sections: &MatchSections) -> Record {
    let mut record = base_record(fixture, sections);

    if let Some(Value::Array(players)) = &sections.squads {
        let home_squad = squad(players, record.get("home_team_id"));
        let away_squad = squad(players, record.get("away_team_id"));
        record.insert("home_team_squad".to_owned(), Value::Array(home_squad));
        record.insert("away_team_squad".to_owned(), Value::Array(away_squad));
    }

    record
}

/// Builds the `match_stats` record.
pub fn match_stats(fixture: &Fixture, sections: &MatchSections) -> Record {
    let mut record = base_record(fixture, sections);

    if let Some(statistics) = &sections.statistics {
        for (group, fields) in STATISTICS_GROUPS {
            if let Some(Value::Object(values)) = statistics.get(*group) {
                copy_fields(values, fields, &mut record);
            }
        }
    }

    if let Some(predictions) = &sections.predictions {
        add_score_predictions(predictions, &mut record);
        add_win_prediction(predictions, &mut record);
    }

    record
}

fn base_record(fixture: &Fixture, sections: &MatchSections) -> Record {
    let mut record = Map::new();
    let summary = fixture.summary();

    record.insert("match_id".to_owned(), match_key_value(&summary.match_id));
    record.insert("league_id".to_owned(), summary.league_id);
    record.insert("league_name".to_owned(), summary.league_name);
    record.insert("home_team".to_owned(), summary.home_team);
    record.insert("away_team".to_owned(), summary.away_team);
    record.insert("match_format".to_owned(), summary.match_format);
    record.insert("match_scheduled_date".to_owned(), summary.match_scheduled_date);
    record.insert("lineup_announce".to_owned(), summary.lineup_announce);

    if let Some(Value::Object(venue)) = &sections.venue {
        copy_fields(venue, VENUE_FIELDS, &mut record);
    }

    record
}

fn match_key_value(key: &MatchKey) -> Value {
    match key {
        MatchKey::Integer(value) => Value::from(*value),
        MatchKey::Text(value) => Value::String(value.clone()),
    }
}

/// Copies present, non-null values under their record names.
fn copy_fields(source: &Map<String, Value>, fields: &[(&str, &str)], target: &mut Record) {
    for (from, to) in fields {
        match source.get(*from) {
            None | Some(Value::Null) => {}
            Some(value) => {
                target.insert((*to).to_owned(), value.clone());
            }
        }
    }
}

/// Compares identifiers by canonical form, so `12` equals `"12"`.
fn same_id(left: &Value, right: &Value) -> bool {
    match (MatchKey::from_value(left), MatchKey::from_value(right)) {
        (Some(left), Some(right)) => left.to_string() == right.to_string(),
        _ => false,
    }
}

fn squad(players: &[Value], team_id: Option<&Value>) -> Vec<Value> {
    let Some(team_id) = team_id else {
        return Vec::new();
    };

    players
        .iter()
        .filter_map(Value::as_object)
        .filter(|player| player.get("team_uid").is_some_and(|uid| same_id(uid, team_id)))
        .map(|player| {
            let mut entry = Map::new();
            copy_fields(player, PLAYER_FIELDS, &mut entry);
            Value::Object(entry)
        })
        .collect()
}

fn add_score_predictions(predictions: &Value, record: &mut Record) {
    let Some(Value::Object(scores)) = predictions.get("score_prediction") else {
        return;
    };

    for side in ["home", "away"] {
        let Some(team_id) = record
            .get(&format!("{side}_team_id"))
            .and_then(MatchKey::from_value)
        else {
            continue;
        };

        if let Some(Value::Object(score)) = scores.get(&team_id.to_string()) {
            let fields = [
                ("score", format!("{side}_team_score_prediction")),
                ("wickets", format!("{side}_team_wicket_prediction")),
            ];
            for (from, to) in fields {
                if let Some(value) = score.get(from).filter(|v| !v.is_null()) {
                    record.insert(to, value.clone());
                }
            }
        }
    }
}

fn add_win_prediction(predictions: &Value, record: &mut Record) {
    let Some(Value::Object(margin)) = predictions.get("win_margin_data") else {
        return;
    };
    let Some(winner) = margin.get("team_uid") else {
        return;
    };

    for side in ["home", "away"] {
        let id_key = format!("{side}_team_id");
        let Some(team_id) = record.get(&id_key).cloned() else {
            continue;
        };
        if !same_id(winner, &team_id) {
            continue;
        }

        let team_name = record
            .get(&format!("{side}_team_name"))
            .cloned()
            .unwrap_or(Value::Null);
        record.insert("win_team_id".to_owned(), team_id);
        record.insert("win_team_name".to_owned(), team_name);
        copy_fields(margin, WIN_MARGIN_FIELDS, record);
        return;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fixture() -> Fixture {
        serde_json::from_value(json!({
            "season_game_uid": 91916,
            "league_id": 12,
            "league_name": "Asia Cup",
            "home": "IND",
            "away": "PAK",
            "format": "T20",
            "season_scheduled_date": "2025-09-14 14:30:00",
            "playing_announce": "0"
        }))
        .unwrap()
    }

    fn sections() -> MatchSections {
        MatchSections {
            venue: Some(json!({
                "ground_name": "Dubai International Stadium",
                "venue_id": "77",
                "subtitle": "Match 6",
                "home_uid": "3",
                "away_uid": 5,
                "home_team": "India",
                "away_team": "Pakistan"
            })),
            statistics: Some(json!({
                "toss_trend": { "bat_first_win": 9, "bat_second_win": 11, "total_matches": 20 },
                "weather": { "temp": 34, "humidity": 60 },
                "unrelated": { "ignored": true }
            })),
            predictions: Some(json!({
                "score_prediction": {
                    "3": { "score": 182, "wickets": 6 },
                    "5": { "score": 164, "wickets": 9 }
                },
                "win_margin_data": { "team_uid": 3, "win_probability": 62, "run": 18 }
            })),
            squads: Some(json!([
                { "team_uid": 3, "player_uid": 101, "full_name": "Virat Kohli", "position": "BAT" },
                { "team_uid": "5", "player_uid": 201, "full_name": "Babar Azam", "position": "BAT" },
                { "team_uid": 9, "player_uid": 301, "full_name": "Somebody Else" }
            ])),
        }
    }

    #[test]
    fn details_record_has_fixture_venue_and_squads() {
        let record = match_details(&fixture(), &sections());

        assert_eq!(record["match_id"], json!(91916));
        assert_eq!(record["home_team"], json!("IND"));
        assert_eq!(record["match_scheduled_date"], json!("2025-09-14 14:30:00"));
        assert_eq!(record["ground_name"], json!("Dubai International Stadium"));
        assert_eq!(record["match_title"], json!("Match 6"));
        assert_eq!(record["home_team_name"], json!("India"));

        let home = record["home_team_squad"].as_array().unwrap();
        let away = record["away_team_squad"].as_array().unwrap();
        assert_eq!(home.len(), 1);
        assert_eq!(home[0]["player_id"], json!(101));
        assert_eq!(away.len(), 1);
        assert_eq!(away[0]["full_name"], json!("Babar Azam"));
        assert!(record.get("temperature").is_none());
    }

    #[test]
    fn stats_record_flattens_statistics_and_predictions() {
        let record = match_stats(&fixture(), &sections());

        assert_eq!(record["bat_first_win_on_this_venue"], json!(9));
        assert_eq!(record["total_matches_played_on_this_venue"], json!(20));
        assert_eq!(record["temperature"], json!(34));
        assert!(record.get("wind_speed").is_none());
        assert!(record.get("ignored").is_none());

        assert_eq!(record["home_team_score_prediction"], json!(182));
        assert_eq!(record["away_team_wicket_prediction"], json!(9));

        assert_eq!(record["win_team_id"], json!("3"));
        assert_eq!(record["win_team_name"], json!("India"));
        assert_eq!(record["win_team_win_probability"], json!(62));
        assert!(record.get("home_team_squad").is_none());
    }

    #[test]
    fn missing_sections_leave_fixture_fields_only() {
        let record = match_stats(&fixture(), &MatchSections::default());

        assert_eq!(record.len(), 8);
        assert_eq!(record["league_name"], json!("Asia Cup"));
        assert!(record.get("ground_name").is_none());
    }

    #[test]
    fn text_match_ids_are_kept_as_strings() {
        let fixture = Fixture::new("M-17");
        let record = match_details(&fixture, &MatchSections::default());
        assert_eq!(record["match_id"], json!("M-17"));
    }
}
