use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use nlgql_core::Config;
use nlgql_execution::{CatalogResolver, DEFAULT_REMOTE_TIMEOUT};
use nlgql_llm::provider::mock::MockLlmProvider;
use nlgql_llm::ChatAiProvider;
use nlgql_orchestrator::{ActiveSchema, QueryOrchestrator, SchemaContext};
use nlgql_schema::Introspector;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::build_router;
use crate::state::AppState;

const INTROSPECTION: &str = include_str!("../../../schema/tests/fixtures/introspection.json");

fn state(llm: Option<MockLlmProvider>) -> Arc<AppState> {
    let schema = Arc::new(SchemaContext::new(
        ActiveSchema::builtin().unwrap(),
        Arc::new(CatalogResolver::sample().unwrap()),
        Introspector::default(),
        DEFAULT_REMOTE_TIMEOUT,
    ));
    let orchestrator = llm.map(|mock| {
        QueryOrchestrator::new(Arc::new(ChatAiProvider::new(Box::new(mock), "mock", 0.0, 1024)))
    });
    Arc::new(AppState {
        config: Config::for_profile("NLGQL_TEST_UNUSED"),
        schema,
        orchestrator,
    })
}

fn scripted(replies: &[&str]) -> MockLlmProvider {
    let mock = MockLlmProvider::new();
    for reply in replies {
        mock.queue_text(reply);
    }
    mock
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Answers introspection with the fixture and any other query with one book.
async fn fake_library() -> String {
    async fn graphql(Json(body): Json<Value>) -> Json<Value> {
        let query = body["query"].as_str().unwrap_or_default();
        if query.contains("__schema") {
            Json(serde_json::from_str(INTROSPECTION).unwrap())
        } else {
            Json(json!({ "data": { "books": [{ "title": "Dune" }] } }))
        }
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/graphql", post(graphql));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/graphql")
}

// ── Health & docs ─────────────────────────────────────────────

#[tokio::test]
async fn health_reports_provider_and_endpoint() {
    let app = build_router(state(None));
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["provider"].is_null());
    assert!(json["endpoint"].is_null());

    let app = build_router(state(Some(scripted(&[]))));
    let (_, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(json["provider"], "mock");
}

#[tokio::test]
async fn docs_are_served() {
    let app = build_router(state(None));
    let resp = app
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ── /ai-query ─────────────────────────────────────────────────

#[tokio::test]
async fn ai_query_without_provider_is_503() {
    let app = build_router(state(None));
    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "list all products" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["validationStatus"], "invalid");
    assert!(json["error"].as_str().unwrap().contains("not configured"));
    assert_eq!(json["steps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ai_query_runs_against_builtin_catalog() {
    let app = build_router(state(Some(scripted(&[
        "```graphql\n{ products { name price } }\n```",
        "NONE",
    ]))));
    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "list all products" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["validationStatus"], "valid");
    assert_eq!(json["retryCount"], 0);
    assert_eq!(json["query"], "{ products { name price } }");
    assert!(!json["result"]["products"].as_array().unwrap().is_empty());
    assert_eq!(json["steps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ai_query_out_of_scope() {
    let app = build_router(state(Some(scripted(&[
        "This API has products, orders, users and categories, but no weather data.",
    ]))));
    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "weather tomorrow" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["validationStatus"], "out_of_scope");
    assert!(json["message"].as_str().unwrap().contains("no weather data"));
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn ai_query_empty_request_is_400() {
    let app = build_router(state(Some(scripted(&[]))));
    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["validationStatus"], "invalid");
}

#[tokio::test]
async fn ai_query_provider_failure_is_502() {
    let mock = MockLlmProvider::new();
    mock.queue_error("upstream exploded");
    let app = build_router(state(Some(mock)));
    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "list all products" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["validationStatus"], "invalid");
    assert!(json["error"].as_str().unwrap().contains("upstream exploded"));
}

// ── /schema-info ──────────────────────────────────────────────

#[tokio::test]
async fn schema_info_on_builtin() {
    let app = build_router(state(None));
    let (status, json) = send(&app, "GET", "/schema-info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["llmContext"]
        .as_str()
        .unwrap()
        .starts_with("## Graph Structure"));
    assert!(!json["analysis"]["entryPoints"].as_array().unwrap().is_empty());
    assert!(!json["exampleQueries"].as_array().unwrap().is_empty());
    assert!(json.get("endpoint").is_none());
}

// ── /connect-endpoint & /disconnect-endpoint ──────────────────

#[tokio::test]
async fn connect_rejects_bad_url() {
    let app = build_router(state(None));
    let (status, json) = send(
        &app,
        "POST",
        "/connect-endpoint",
        Some(json!({ "endpoint": "not a url" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().starts_with("Invalid endpoint URL"));
}

#[tokio::test]
async fn connect_failure_is_502_and_keeps_builtin() {
    let app = build_router(state(None));
    let (status, json) = send(
        &app,
        "POST",
        "/connect-endpoint",
        Some(json!({ "endpoint": "http://127.0.0.1:9/graphql" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "network");
    assert_eq!(json["endpoint"], "http://127.0.0.1:9/graphql");
    assert!(json.get("statusCode").is_none());

    let (_, info) = send(&app, "GET", "/schema-info", None).await;
    assert!(info.get("exampleQueries").is_some());
}

#[tokio::test]
async fn connect_query_disconnect() {
    let endpoint = fake_library().await;
    let app = build_router(state(Some(scripted(&["{ books { title } }", "NONE"]))));

    let (status, json) = send(
        &app,
        "POST",
        "/connect-endpoint",
        Some(json!({ "endpoint": endpoint, "headers": { "Authorization": "Bearer t" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["endpoint"], endpoint);
    assert!(json["analysis"]["types"].as_u64().unwrap() > 0);
    assert!(json["sdl"].as_str().unwrap().contains("type Book"));

    let (_, info) = send(&app, "GET", "/schema-info", None).await;
    assert_eq!(info["endpoint"], endpoint);
    assert!(info.get("exampleQueries").is_none());

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["endpoint"], endpoint);

    let (status, json) = send(
        &app,
        "POST",
        "/ai-query",
        Some(json!({ "naturalLanguage": "all book titles" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["validationStatus"], "valid");
    assert_eq!(json["result"]["books"][0]["title"], "Dune");

    let (status, json) = send(&app, "POST", "/disconnect-endpoint", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (_, info) = send(&app, "GET", "/schema-info", None).await;
    assert!(info.get("endpoint").is_none());
    assert!(info.get("exampleQueries").is_some());
}
