//! Switching the active schema between the built-in demo and a remote endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nlgql_schema::{AnalysisSummary, IntrospectionErrorKind};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ConnectRequest {
    /// GraphQL endpoint URL (http or https).
    pub endpoint: String,
    /// Headers sent with introspection and every proxied query.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ConnectResponse {
    pub success: bool,
    pub endpoint: String,
    /// Element counts of the new schema.
    #[schema(value_type = Object)]
    pub analysis: AnalysisSummary,
    pub sdl: String,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectErrorResponse {
    pub success: bool,
    pub error: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub kind: Option<IntrospectionErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DisconnectResponse {
    pub success: bool,
}

fn check_url(endpoint: &str) -> Result<(), String> {
    let url = url::Url::parse(endpoint).map_err(|e| format!("Invalid endpoint URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!(
            "Invalid endpoint URL: unsupported scheme '{other}' (expected http or https)"
        )),
    }
}

/// Introspect an endpoint and make it the active schema.
#[utoipa::path(
    post,
    path = "/connect-endpoint",
    tag = "Schema",
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Endpoint connected", body = ConnectResponse),
        (status = 400, description = "Invalid URL", body = ConnectErrorResponse),
        (status = 502, description = "Introspection failed", body = ConnectErrorResponse),
    )
)]
pub async fn connect_endpoint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, (StatusCode, Json<ConnectErrorResponse>)> {
    let endpoint = req.endpoint.trim().to_string();

    if let Err(error) = check_url(&endpoint) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ConnectErrorResponse {
                success: false,
                error,
                endpoint,
                kind: None,
                status_code: None,
            }),
        ));
    }

    info!("Connecting to {}", endpoint);
    let active = state
        .schema
        .connect(&endpoint, req.headers)
        .await
        .map_err(|e| {
            warn!(endpoint = %e.endpoint, kind = ?e.kind, "connect failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ConnectErrorResponse {
                    success: false,
                    error: e.message.clone(),
                    endpoint: e.endpoint.clone(),
                    kind: Some(e.kind),
                    status_code: e.status_code,
                }),
            )
        })?;

    Ok(Json(ConnectResponse {
        success: true,
        endpoint,
        analysis: active.analysis.summary(),
        sdl: active.sdl.clone(),
    }))
}

/// Restore the built-in demo schema.
#[utoipa::path(
    post,
    path = "/disconnect-endpoint",
    tag = "Schema",
    responses(
        (status = 200, description = "Built-in schema restored", body = DisconnectResponse)
    )
)]
pub async fn disconnect_endpoint(State(state): State<Arc<AppState>>) -> Json<DisconnectResponse> {
    state.schema.disconnect();
    Json(DisconnectResponse { success: true })
}

#[cfg(test)]
mod tests {
    use super::check_url;

    #[test]
    fn only_http_urls_are_accepted() {
        assert!(check_url("http://localhost:4000/graphql").is_ok());
        assert!(check_url("https://api.example.com/graphql").is_ok());
        assert!(check_url("not a url").is_err());
        assert!(check_url("ftp://example.com/graphql")
            .unwrap_err()
            .contains("unsupported scheme 'ftp'"));
    }
}
