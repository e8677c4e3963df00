//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── command: Command         # serve (default) or bootstrap
//! ├── server: ServerConfig     # Host, port, timeouts, body limit
//! └── service: ServiceConfig   # Qdrant, embedding, LLM, feeds, store, index
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! pitchside --qdrant-url http://qdrant:6334 --port 8080
//!
//! QDRANT_URL=http://qdrant:6334 PORT=8080 pitchside bootstrap
//! ```

mod server;

use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pitchside_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// What the process does after loading configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Subcommand, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Serve the HTTP API.
    #[default]
    Serve,
    /// Create every configured Qdrant collection and payload index, then exit.
    Bootstrap,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "pitchside")]
#[command(about = "Cricket fixture indexing and match question answering")]
#[command(version)]
pub struct Cli {
    /// Subcommand; serves the API when omitted.
    #[command(subcommand)]
    #[serde(default)]
    pub command: Option<Command>,

    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// External service configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is read before clap parses arguments, so its values act
    /// as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Returns the selected subcommand.
    pub fn subcommand(&self) -> Command {
        self.command.unwrap_or_default()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.subcommand() == Command::Serve {
            self.server
                .validate()
                .context("invalid server configuration")?;
        }

        self.service
            .validate()
            .context("invalid service configuration")?;
        Ok(())
    }

    /// Logs configuration (no secrets).
    pub fn log(&self) {
        Self::log_build_info();

        if self.subcommand() == Command::Serve {
            self.server.log();
        }

        let service = &self.service;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            qdrant_url = %service.qdrant.qdrant_url,
            qdrant_api_key = service.qdrant.api_key().is_some(),
            query_api = %service.index.qdrant_query_api,
            id_index_type = %service.index.id_index_type,
            match_details_collection = %service.index.match_details_collection,
            match_stats_collection = %service.index.match_stats_collection,
            "Vector store configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            embedding_provider = %service.embedding.embedding_provider,
            embedding_model = %service.embedding.embedding_model,
            embedding_dim = service.embedding.embedding_dim,
            completion_model = %service.completion.completion_model,
            store_backend = %service.store.store_backend,
            "Provider configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
