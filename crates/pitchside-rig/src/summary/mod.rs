//! Prose summaries of enriched match records.

mod prompt;

use async_trait::async_trait;
use rig::agent::{Agent, AgentBuilder};
use rig::completion::{CompletionModel, Prompt};
use rig::prelude::CompletionClient;
use rig::providers::openai;
use serde_json::Value;

use crate::TRACING_TARGET_SUMMARY;
use crate::config::CompletionConfig;
use crate::{Error, Result};

/// Turns a structured match record into prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes `record`, following `style_guide` when it is non-empty.
    async fn summarize(&self, record: &Value, style_guide: &Value) -> Result<String>;
}

/// [`Summarizer`] backed by a rig completion agent.
pub struct RigSummarizer<M: CompletionModel> {
    agent: Agent<M>,
    model_name: String,
}

impl<M: CompletionModel> RigSummarizer<M> {
    /// Wraps a completion model with the documentation preamble.
    ///
    /// Must be called inside a tokio runtime: building the agent spawns its
    /// tool server.
    pub fn new(model: M, model_name: impl Into<String>) -> Self {
        let agent = AgentBuilder::new(model).preamble(prompt::PREAMBLE).build();
        Self {
            agent,
            model_name: model_name.into(),
        }
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl RigSummarizer<openai::CompletionModel> {
    /// Builds a summarizer over the OpenAI chat completions API.
    ///
    /// Must be called inside a tokio runtime.
    pub fn openai(config: &CompletionConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config
            .api_key()
            .ok_or_else(|| Error::config("OPENAI_API_KEY is required for summaries"))?;
        let client = openai::Client::new(api_key)
            .map_err(|e| Error::provider("openai", e))?
            .completions_api();

        tracing::info!(
            target: TRACING_TARGET_SUMMARY,
            model = %config.completion_model,
            "Summarizer ready"
        );

        Ok(Self::new(
            client.completion_model(&config.completion_model),
            &config.completion_model,
        ))
    }
}

#[async_trait]
impl<M> Summarizer for RigSummarizer<M>
where
    M: CompletionModel + Send + Sync,
{
    async fn summarize(&self, record: &Value, style_guide: &Value) -> Result<String> {
        let prompt = prompt::build(record, style_guide)?;

        tracing::debug!(
            target: TRACING_TARGET_SUMMARY,
            model = %self.model_name,
            prompt_len = prompt.len(),
            "Requesting summary"
        );

        let summary = self
            .agent
            .prompt(prompt.as_str())
            .await
            .map_err(|e| Error::provider(&self.model_name, e))?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(Error::EmptyResponse(self.model_name.clone()));
        }

        Ok(summary.to_owned())
    }
}

impl<M: CompletionModel> std::fmt::Debug for RigSummarizer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigSummarizer")
            .field("model", &self.model_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let err = RigSummarizer::openai(&CompletionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_openai_builds_with_key() {
        let config = CompletionConfig {
            openai_api_key: Some("sk-test".into()),
            ..CompletionConfig::default()
        };
        let summarizer = RigSummarizer::openai(&config).unwrap();
        assert_eq!(summarizer.model_name(), "gpt-4o-mini");
    }
}
