#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use pitchside_server::handler::routes;
use pitchside_server::middleware::RouterExt;
use pitchside_server::service::ServiceState;
use pitchside_vector::CollectionBootstrapper;

use crate::config::{Cli, Command};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "pitchside_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "pitchside_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "pitchside_cli::config";
pub const TRACING_TARGET_BOOTSTRAP: &str = "pitchside_cli::bootstrap";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        command = ?cli.subcommand(),
        "starting pitchside"
    );

    cli.log();
    cli.validate()?;

    match cli.subcommand() {
        Command::Serve => {
            let state = ServiceState::from_config(&cli.service)
                .await
                .context("failed to create service state")?;
            let router = create_router(state, &cli);
            server::serve(router, cli.server).await?;
        }
        Command::Bootstrap => bootstrap(&cli).await?,
    }

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Error handling (outermost): catches panics and enforces the request timeout
/// 2. Observability: request IDs and tracing spans
/// 3. Body limit
/// 4. Routes (innermost)
fn create_router(state: ServiceState, cli: &Cli) -> Router {
    routes()
        .with_state(state)
        .with_body_limit_layer(cli.server.body_limit)
        .with_observability_layer()
        .with_error_handling_layer(cli.server.request_timeout())
}

/// Creates every configured collection and its payload indexes.
///
/// Index failures are reported and skipped; the command only fails when
/// Qdrant itself cannot be reached or a collection cannot be created.
async fn bootstrap(cli: &Cli) -> anyhow::Result<()> {
    let backend = cli
        .service
        .connect_qdrant()
        .context("failed to connect to qdrant")?;
    let index_config = cli.service.index_config();
    let bootstrapper = CollectionBootstrapper::new(Arc::clone(&backend), index_config.clone());

    let reports = bootstrapper.ensure_all().await;
    for report in &reports {
        tracing::info!(
            target: TRACING_TARGET_BOOTSTRAP,
            collection = %report.collection,
            created_collection = report.created_collection,
            created_indexes = ?report.created_indexes,
            skipped_indexes = ?report.skipped_indexes,
            "Collection ready"
        );
    }

    for collection in index_config.collection_names() {
        backend
            .collection_info(collection)
            .await
            .with_context(|| format!("collection {collection} is not available"))?;
    }

    Ok(())
}
