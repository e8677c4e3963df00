//! Fixed documentation prompt.

use serde_json::Value;

pub(crate) const PREAMBLE: &str =
    "You are an expert cricket analyst and documentation assistant.";

const INSTRUCTIONS: &str = "\
Write a detailed summary of the upcoming cricket match below for fantasy
analysis. The style guide describes what each key of the match data means.
Explain every key and its value, grouped under these sections:

1. Match and tournament: title, match id, league, format and scheduled time.
2. Teams: home and away names, team ids and squad information.
3. Players: roles (BAT, BOW, AR, WK), last match played and nicknames.
4. Venue and pitch: ground, venue id, matches played there and pitch support.
5. Weather and conditions: temperature, humidity, clouds, visibility and wind.
6. Historical and predicted scores: innings averages, predicted scores,
   predicted wickets and win probabilities.
7. Bowling and batting support: what the surface offers each discipline.
8. Outcome prediction: predicted winner, margin and winning chance.

Write readable paragraphs under short headings. Skip sections the data does
not cover and never invent figures.";

/// Builds the user prompt for one record.
pub(crate) fn build(record: &Value, style_guide: &Value) -> Result<String, serde_json::Error> {
    let style_guide = match style_guide {
        Value::Object(map) if map.is_empty() => "(none)".to_owned(),
        Value::Null => "(none)".to_owned(),
        other => serde_json::to_string_pretty(other)?,
    };
    let record = serde_json::to_string_pretty(record)?;

    Ok(format!(
        "{INSTRUCTIONS}\n\nStyle guide:\n{style_guide}\n\nMatch data:\n{record}"
    ))
}
