use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use nlgql_schema::{SchemaAnalysis, EXAMPLE_QUERIES};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfoResponse {
    #[schema(value_type = Object)]
    pub analysis: SchemaAnalysis,
    /// Prompt-ready text form of the analysis.
    pub llm_context: String,
    /// Set when an external endpoint is connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Sample requests for the built-in schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_queries: Option<Vec<&'static str>>,
}

/// Analysis of the active schema.
#[utoipa::path(
    get,
    path = "/schema-info",
    tag = "Schema",
    responses(
        (status = 200, description = "Active schema analysis", body = SchemaInfoResponse)
    )
)]
pub async fn schema_info(State(state): State<Arc<AppState>>) -> Json<SchemaInfoResponse> {
    let active = state.schema.snapshot();
    let endpoint = active.endpoint().map(str::to_string);
    let example_queries = endpoint.is_none().then(|| EXAMPLE_QUERIES.to_vec());

    Json(SchemaInfoResponse {
        analysis: active.analysis.clone(),
        llm_context: active.llm_context.clone(),
        endpoint,
        example_queries,
    })
}
