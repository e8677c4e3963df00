//! Scripted summarizer for tests.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::summary::Summarizer;
use crate::{Error, Result};

/// Summarizer that renders a fixed template and records its inputs.
///
/// The summary is `"Summary of match {match_id}"`, or an error for every
/// record whose `match_id` is listed in `fail_for`.
#[derive(Debug, Clone, Default)]
pub struct MockSummarizer {
    fail_for: Vec<Value>,
    calls: Arc<Mutex<Vec<(Value, Value)>>>,
}

impl MockSummarizer {
    /// Creates a summarizer that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails for records carrying this `match_id`.
    pub fn failing_for(mut self, match_id: impl Into<Value>) -> Self {
        self.fail_for.push(match_id.into());
        self
    }

    /// Returns every `(record, style_guide)` pair seen so far.
    pub async fn calls(&self) -> Vec<(Value, Value)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, record: &Value, style_guide: &Value) -> Result<String> {
        self.calls
            .lock()
            .await
            .push((record.clone(), style_guide.clone()));

        let match_id = record.get("match_id").cloned().unwrap_or(Value::Null);
        if self.fail_for.contains(&match_id) {
            return Err(Error::provider("mock", "scripted failure"));
        }

        Ok(format!("Summary of match {match_id}"))
    }
}
