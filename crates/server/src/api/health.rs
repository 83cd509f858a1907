use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Active AI provider, if one is configured.
    pub provider: Option<String>,
    /// Connected endpoint, or null on the built-in schema.
    pub endpoint: Option<String>,
}

/// Liveness plus the active provider and schema source.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: state
            .orchestrator
            .as_ref()
            .map(|o| o.provider_name().to_string()),
        endpoint: state.schema.snapshot().endpoint().map(str::to_string),
    })
}
