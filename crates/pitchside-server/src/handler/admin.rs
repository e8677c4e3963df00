//! Summary style guide management.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use pitchside_opendal::DocumentStore;
use serde_json::Value;

use crate::extract::{Json, ValidateJson};
use crate::handler::Result;
use crate::handler::request::UpsertDescription;
use crate::handler::response::DescriptionStored;
use crate::service::{MATCH_DESCRIPTIONS, ServiceState};

/// Tracing target for admin operations.
const TRACING_TARGET: &str = "pitchside_server::handler::admin";

/// Creates or updates the style guide used for one kind of summary.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn add_update_match_description(
    State(store): State<DocumentStore>,
    ValidateJson(request): ValidateJson<UpsertDescription>,
) -> Result<Json<DescriptionStored>> {
    let description_type = request.description_type().to_owned();

    let mut fields = request.description_data;
    fields.insert(
        "description_type".to_owned(),
        Value::String(description_type.clone()),
    );

    let status = store
        .upsert_by_key(MATCH_DESCRIPTIONS, &description_type, fields)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        description_type = %description_type,
        status = %status,
        "Match description stored"
    );

    Ok(Json(DescriptionStored {
        status,
        description_type,
    }))
}

/// Returns a [`Router`] with all admin routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route(
        "/admin/add_update_match_description",
        post(add_update_match_description),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pitchside_opendal::UpsertStatus;
    use serde_json::json;

    use super::*;
    use crate::handler::test::TestContext;

    #[tokio::test]
    async fn test_insert_then_update() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let request = json!({
            "description_type": "match_stats",
            "description_data": { "tone": "neutral", "length": "short" }
        });
        let response = server
            .post("/admin/add_update_match_description")
            .json(&request)
            .await;
        response.assert_status_ok();
        let stored = response.json::<DescriptionStored>();
        assert_eq!(stored.status, UpsertStatus::Inserted);
        assert_eq!(stored.description_type, "match_stats");

        let request = json!({
            "description_type": " match_stats ",
            "description_data": { "tone": "upbeat" }
        });
        let response = server
            .post("/admin/add_update_match_description")
            .json(&request)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<DescriptionStored>().status, UpsertStatus::Updated);

        let guide = context
            .store
            .get_by_key(MATCH_DESCRIPTIONS, "match_stats")
            .await?
            .ok_or_else(|| anyhow::anyhow!("guide not stored"))?;
        assert_eq!(guide["tone"], json!("upbeat"));
        assert_eq!(guide["length"], json!("short"));
        assert_eq!(guide["description_type"], json!("match_stats"));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_description_type_is_bad_request() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/admin/add_update_match_description")
            .json(&json!({ "description_type": "   ", "description_data": {} }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body = response.json::<serde_json::Value>();
        assert_eq!(body["status"], json!("bad_request"));

        Ok(())
    }

    #[tokio::test]
    async fn test_path_like_description_type_is_bad_request() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/admin/add_update_match_description")
            .json(&json!({ "description_type": "../match_stats" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }
}
