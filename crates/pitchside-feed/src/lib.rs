#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
mod mock;
mod source;
mod types;

pub use crate::client::FeedClient;
pub use crate::config::{DEFAULT_FEED_TIMEOUT_SECS, FeedConfig};
pub use crate::error::{FeedError, FeedResult};
#[cfg(any(test, feature = "test-utils"))]
pub use crate::mock::StaticFixtureSource;
pub use crate::source::FixtureSource;
pub use crate::types::{FeedSection, Fixture, FixtureSummary, MatchSections, SPORTS_ID_CRICKET};

/// Tracing target for feed client operations.
pub const TRACING_TARGET_CLIENT: &str = "pitchside_feed::client";
