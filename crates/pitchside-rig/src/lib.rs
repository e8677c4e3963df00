#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for embedding requests.
pub const TRACING_TARGET_EMBEDDING: &str = "pitchside_rig::embedding";

/// Tracing target for summary requests.
pub const TRACING_TARGET_SUMMARY: &str = "pitchside_rig::summary";

pub mod config;
mod embedding;
mod error;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod summary;

pub use config::{CompletionConfig, EmbeddingConfig, EmbeddingProviderKind};
pub use embedding::RigEmbedder;
pub use error::{Error, Result};
pub use summary::{RigSummarizer, Summarizer};
