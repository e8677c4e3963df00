//! Match question answering.

use std::collections::HashMap;

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use pitchside_vector::{IdentifierStorage, SearchFilter, Searcher};

use crate::extract::{Json, ValidateJson};
use crate::handler::request::UserQuestion;
use crate::handler::response::QuestionAnswer;
use crate::handler::{ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for user question operations.
const TRACING_TARGET: &str = "pitchside_server::handler::user";

/// Searches every configured collection for passages about one match.
#[tracing::instrument(skip_all, target = TRACING_TARGET)]
async fn handle_user_question(
    State(searcher): State<Searcher>,
    State(identifier_storage): State<IdentifierStorage>,
    ValidateJson(request): ValidateJson<UserQuestion>,
) -> Result<Json<QuestionAnswer>> {
    let Some(match_key) = request.match_id else {
        return Err(ErrorKind::BadRequest
            .with_message("match_id is required")
            .with_resource("match_id"));
    };

    let filter = SearchFilter::match_id(&match_key, identifier_storage);
    let filters: HashMap<String, SearchFilter> = searcher
        .config()
        .collections
        .iter()
        .map(|collection| (collection.clone(), filter.clone()))
        .collect();

    tracing::debug!(
        target: TRACING_TARGET,
        match_id = %match_key,
        filter = ?filter.equals,
        "Searching match collections"
    );

    let results = searcher
        .search(request.question.trim(), None, &filters)
        .await?;

    tracing::info!(
        target: TRACING_TARGET,
        match_id = %match_key,
        hits = results.values().map(Vec::len).sum::<usize>(),
        "User question answered"
    );

    Ok(Json(QuestionAnswer {
        match_id: match_key.to_string(),
        results,
    }))
}

/// Returns a [`Router`] with all user routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/user/handle_user_question", post(handle_user_question))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pitchside_vector::backend::BackendOperation;
    use pitchside_vector::BackendErrorKind;
    use serde_json::{Value, json};

    use super::*;
    use crate::handler::cron;
    use crate::handler::test::{TestContext, sample_fixture, sample_sections};

    #[tokio::test]
    async fn test_missing_match_id_is_bad_request() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/user/handle_user_question")
            .json(&json!({ "question": "Who will win?" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body = response.json::<Value>();
        assert_eq!(body["status"], json!("bad_request"));
        assert!(body["message"].as_str().is_some_and(|m| m.contains("match_id")));

        Ok(())
    }

    #[tokio::test]
    async fn test_blank_question_is_bad_request() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/user/handle_user_question")
            .json(&json!({ "match_id": 91916, "question": "  " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/user/handle_user_question")
            .text("{ not json")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_match_has_empty_results() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/user/handle_user_question")
            .json(&json!({ "match_id": "404", "question": "Who will win?" }))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["match_id"], json!("404"));
        assert_eq!(body["results"]["match_details"], json!([]));
        assert_eq!(body["results"]["match_stats"], json!([]));

        Ok(())
    }

    #[tokio::test]
    async fn test_forbidden_query_returns_hints() -> anyhow::Result<()> {
        let context = TestContext::new(Vec::new()).await?;
        context
            .backend
            .fail(BackendOperation::Query, None, BackendErrorKind::Forbidden)
            .await;
        let server = context.server_with_router(routes())?;

        let response = server
            .post("/user/handle_user_question")
            .json(&json!({ "match_id": 91916, "question": "Who will win?" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let body = response.json::<Value>();
        assert_eq!(body["status"], json!("forbidden"));
        assert!(body["message"].as_str().is_some());
        let hints = body["hints"].as_array().map(Vec::len).unwrap_or_default();
        assert!(hints > 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_answers_from_indexed_match() -> anyhow::Result<()> {
        let context =
            TestContext::new(vec![sample_fixture(91916), sample_fixture(91917)]).await?;
        context.feed.set_sections(91916_i64, sample_sections()).await;
        let server = context.server_with_router(routes().merge(cron::routes()))?;

        server
            .get("/cron/get_upcoming_matches_cron")
            .await
            .assert_status_ok();
        server
            .get("/cron/get_upcoming_matches_embeding")
            .await
            .assert_status_ok();

        // String and numeric identifiers select the same match.
        for match_id in [json!("91916"), json!(91916)] {
            let response = server
                .post("/user/handle_user_question")
                .json(&json!({ "match_id": match_id, "question": "Who is playing?" }))
                .await;
            response.assert_status_ok();

            let body = response.json::<Value>();
            assert_eq!(body["match_id"], json!("91916"));

            for collection in ["match_details", "match_stats"] {
                let hits = body["results"][collection]
                    .as_array()
                    .ok_or_else(|| anyhow::anyhow!("missing {collection} results"))?;
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0]["payload"]["match_id"], json!(91916));
                assert_eq!(hits[0]["payload"]["text"], json!("Summary of match 91916"));
            }
        }

        Ok(())
    }
}
