//! Natural-language query endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nlgql_orchestrator::AiQueryResponse;
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryRequest {
    /// Plain-language description of the data wanted.
    pub natural_language: String,
}

/// Translate natural language into a GraphQL query, validate it, run it.
#[utoipa::path(
    post,
    path = "/ai-query",
    tag = "Query",
    request_body = AiQueryRequest,
    responses(
        (status = 200, description = "Pipeline finished (see validationStatus)", body = AiQueryResponse),
        (status = 400, description = "Empty request", body = AiQueryResponse),
        (status = 502, description = "AI provider failed", body = AiQueryResponse),
        (status = 503, description = "No AI provider configured", body = AiQueryResponse),
    )
)]
pub async fn ai_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AiQueryRequest>,
) -> (StatusCode, Json<AiQueryResponse>) {
    let Some(orchestrator) = state.orchestrator.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(AiQueryResponse::failure(
                "AI provider not configured. Set LLM_PROVIDER and its API key.",
            )),
        );
    };

    let natural_language = req.natural_language.trim();
    if natural_language.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AiQueryResponse::failure("naturalLanguage must not be empty")),
        );
    }

    match orchestrator.run_in(&state.schema, natural_language).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            warn!("AI query failed: {}", e);
            (StatusCode::BAD_GATEWAY, Json(AiQueryResponse::failure(e.to_string())))
        }
    }
}
