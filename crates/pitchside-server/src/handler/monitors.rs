//! Liveness handler.

use axum::Router;
use axum::routing::get;

use crate::extract::Json;
use crate::handler::response::MonitorStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "pitchside_server::handler::monitors";

/// Reports that the process is serving requests.
///
/// Does not probe Qdrant or the feeds; the searcher self-test covers
/// credentials at startup.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn health_status() -> Json<MonitorStatus> {
    tracing::debug!(target: TRACING_TARGET, "Health status check requested");
    Json(MonitorStatus::default())
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}
