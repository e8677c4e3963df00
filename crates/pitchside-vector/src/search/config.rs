//! Searcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::config::{MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION};
use crate::error::{VectorError, VectorResult};

/// Default number of hits per collection.
pub const DEFAULT_TOP_K: usize = 5;

/// Default timeout applied to each backend call on the search path.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Which query call shape the searcher uses.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString
)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QueryApi {
    /// Try the universal query endpoint, fall back to legacy search once.
    #[default]
    Auto,
    /// Always use the universal query endpoint.
    Query,
    /// Always use the legacy search endpoint.
    Search,
}

/// Settings for [`Searcher`].
///
/// [`Searcher`]: super::Searcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct SearcherConfig {
    /// Collections queried by every search, in order.
    pub collections: Vec<String>,
    /// Hits per collection when the caller does not ask for a number.
    #[serde(default = "SearcherConfig::default_top_k")]
    pub top_k: usize,
    /// Timeout for each backend call.
    #[serde(default = "SearcherConfig::default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    /// Whether [`Searcher::connect`] lists collections before returning.
    ///
    /// [`Searcher::connect`]: super::Searcher::connect
    #[serde(default = "SearcherConfig::default_run_self_test")]
    pub run_self_test: bool,
    /// Query call shape.
    #[serde(default)]
    pub query_api: QueryApi,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        Self::new([MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION])
    }
}

impl SearcherConfig {
    /// Creates a configuration over the given collections.
    pub fn new(collections: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            collections: collections.into_iter().map(Into::into).collect(),
            top_k: DEFAULT_TOP_K,
            timeout: DEFAULT_SEARCH_TIMEOUT,
            run_self_test: true,
            query_api: QueryApi::default(),
        }
    }

    /// Sets the default number of hits per collection.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the connect-time self-test.
    pub fn with_self_test(mut self, run_self_test: bool) -> Self {
        self.run_self_test = run_self_test;
        self
    }

    /// Sets the query call shape.
    pub fn with_query_api(mut self, query_api: QueryApi) -> Self {
        self.query_api = query_api;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        if self.collections.is_empty() {
            return Err(VectorError::invalid_config(
                "searcher needs at least one collection",
            ));
        }

        if self.top_k == 0 {
            return Err(VectorError::invalid_config("top_k must be positive"));
        }

        if self.timeout.is_zero() {
            return Err(VectorError::invalid_config(
                "search timeout must be positive",
            ));
        }

        Ok(())
    }

    fn default_top_k() -> usize {
        DEFAULT_TOP_K
    }

    fn default_timeout() -> Duration {
        DEFAULT_SEARCH_TIMEOUT
    }

    fn default_run_self_test() -> bool {
        true
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
