//! Feed endpoint configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use url::Url;

use crate::types::FeedSection;
use crate::{FeedError, FeedResult};

/// Default timeout for feed requests in seconds.
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;

/// Upstream feed endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct FeedConfig {
    /// Upcoming fixture list URL.
    #[cfg_attr(feature = "config", arg(long, env = "SOURCE_URL"))]
    pub source_url: Option<String>,

    /// Venue feed URL.
    #[cfg_attr(feature = "config", arg(long, env = "SOURCE_URL_1"))]
    pub venue_url: Option<String>,

    /// Statistics feed URL.
    #[cfg_attr(feature = "config", arg(long, env = "SOURCE_URL_2"))]
    pub statistics_url: Option<String>,

    /// Predictions feed URL.
    #[cfg_attr(feature = "config", arg(long, env = "SOURCE_URL_3"))]
    pub predictions_url: Option<String>,

    /// Squads feed URL.
    #[cfg_attr(feature = "config", arg(long, env = "SOURCE_URL_4"))]
    pub squads_url: Option<String>,

    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "FEED_TIMEOUT", default_value_t = DEFAULT_FEED_TIMEOUT_SECS)
    )]
    pub feed_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_url: None,
            venue_url: None,
            statistics_url: None,
            predictions_url: None,
            squads_url: None,
            feed_timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
        }
    }
}

impl FeedConfig {
    /// Creates a configuration for the given fixture list URL.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: Some(source_url.into()),
            ..Self::default()
        }
    }

    /// Sets the URL of an auxiliary feed.
    pub fn with_section_url(mut self, feed: FeedSection, url: impl Into<String>) -> Self {
        let url = Some(url.into());
        match feed {
            FeedSection::Venue => self.venue_url = url,
            FeedSection::Statistics => self.statistics_url = url,
            FeedSection::Predictions => self.predictions_url = url,
            FeedSection::Squads => self.squads_url = url,
        }
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.feed_timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the request timeout, using the default when zero.
    pub fn timeout(&self) -> Duration {
        match self.feed_timeout_secs {
            0 => Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the configured URL string for an auxiliary feed.
    pub fn section_url(&self, feed: FeedSection) -> Option<&str> {
        let url = match feed {
            FeedSection::Venue => &self.venue_url,
            FeedSection::Statistics => &self.statistics_url,
            FeedSection::Predictions => &self.predictions_url,
            FeedSection::Squads => &self.squads_url,
        };
        url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Parses and returns the fixture list URL.
    pub fn parsed_source_url(&self) -> FeedResult<Url> {
        let raw = self
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| FeedError::config("SOURCE_URL is required"))?;
        parse_url("SOURCE_URL", raw)
    }

    /// Parses and returns the URL of an auxiliary feed, if configured.
    pub fn parsed_section_url(&self, feed: FeedSection) -> FeedResult<Option<Url>> {
        self.section_url(feed)
            .map(|raw| parse_url(feed.as_ref(), raw))
            .transpose()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> FeedResult<()> {
        self.parsed_source_url()?;
        for feed in FeedSection::iter() {
            self.parsed_section_url(feed)?;
        }
        Ok(())
    }
}

fn parse_url(name: &str, raw: &str) -> FeedResult<Url> {
    let url = Url::parse(raw).map_err(|e| FeedError::config(format!("{name}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FeedError::config(format!(
            "{name}: unsupported scheme '{scheme}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_is_required() {
        assert!(FeedConfig::default().validate().is_err());
        assert!(FeedConfig::new("   ").validate().is_err());
        assert!(FeedConfig::new("http://feed.local/fixtures").validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(FeedConfig::new("not a url").validate().is_err());
        assert!(FeedConfig::new("ftp://feed.local").validate().is_err());

        let config = FeedConfig::new("http://feed.local/fixtures")
            .with_section_url(FeedSection::Squads, "::");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_section_urls() {
        let config = FeedConfig::new("http://feed.local/fixtures")
            .with_section_url(FeedSection::Venue, "http://feed.local/venue")
            .with_section_url(FeedSection::Statistics, "  ");

        assert_eq!(
            config.section_url(FeedSection::Venue),
            Some("http://feed.local/venue")
        );
        assert_eq!(config.section_url(FeedSection::Statistics), None);
        assert!(
            config
                .parsed_section_url(FeedSection::Squads)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_zero_timeout_uses_default() {
        let config = FeedConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
