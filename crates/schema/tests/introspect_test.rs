//! Introspection against throwaway HTTP servers bound to 127.0.0.1:0.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use nlgql_schema::{
    analyze, IntrospectionCache, IntrospectionErrorKind, IntrospectionOptions, Introspector,
};

const FIXTURE: &str = include_str!("fixtures/introspection.json");

#[derive(Clone)]
struct Fake {
    hits: Arc<AtomicUsize>,
    reply: fn(&HeaderMap) -> Response,
}

async fn graphql(State(fake): State<Fake>, headers: HeaderMap, _body: String) -> Response {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    (fake.reply)(&headers)
}

async fn spawn(reply: fn(&HeaderMap) -> Response) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route("/graphql", post(graphql)).with_state(Fake {
        hits: Arc::clone(&hits),
        reply,
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/graphql"), hits)
}

fn fixture(_: &HeaderMap) -> Response {
    let value: Value = serde_json::from_str(FIXTURE).unwrap();
    Json(value).into_response()
}

fn introspector(ttl: Duration) -> Introspector {
    Introspector::new(Duration::from_secs(10), Arc::new(IntrospectionCache::new(ttl)))
}

#[tokio::test]
async fn fixture_builds_a_usable_schema() {
    let (url, _) = spawn(fixture).await;
    let result = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap();

    assert_eq!(result.endpoint, url);
    assert!(result.sdl.contains("type Book"));
    assert!(result.sdl.contains("enum Genre"));
    assert!(!result.sdl.contains("__Schema"));

    let analysis = analyze(&result.schema);
    let names: Vec<&str> = analysis.types.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Book", "Author"]);
    assert_eq!(analysis.summary().queries, 2);
    assert_eq!(analysis.summary().mutations, 1);
    assert_eq!(analysis.types[0].description.as_deref(), Some("A printed work"));

    let outcome = nlgql_schema::validate(&result.schema, "{ books { title author { name } } }");
    assert!(outcome.valid, "{:?}", outcome.errors);
}

#[tokio::test]
async fn second_call_within_ttl_is_cached() {
    let (url, hits) = spawn(fixture).await;
    let introspector = introspector(Duration::from_secs(300));
    let options = IntrospectionOptions::new(&url);

    let first = introspector.introspect(&options).await.unwrap();
    let second = introspector.introspect(&options).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn expired_entry_is_refetched() {
    let (url, hits) = spawn(fixture).await;
    let introspector = introspector(Duration::from_millis(50));
    let options = IntrospectionOptions::new(&url);

    introspector.introspect(&options).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    introspector.introspect(&options).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn clearing_the_cache_forces_a_fetch() {
    let (url, hits) = spawn(fixture).await;
    let introspector = introspector(Duration::from_secs(300));
    let options = IntrospectionOptions::new(&url);

    introspector.introspect(&options).await.unwrap();
    introspector.cache().clear(Some(&url));
    introspector.introspect(&options).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn caller_headers_are_forwarded() {
    fn guarded(headers: &HeaderMap) -> Response {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer letmein") => fixture(headers),
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
    let (url, _) = spawn(guarded).await;
    let introspector = introspector(Duration::from_secs(300));

    let err = introspector
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::Authentication);
    assert_eq!(err.status_code, Some(401));
    assert_eq!(
        err.message,
        "Authentication failed (HTTP 401). Check your headers / API key."
    );

    let headers = [("Authorization".to_string(), "Bearer letmein".to_string())]
        .into_iter()
        .collect();
    let ok = introspector
        .introspect(&IntrospectionOptions::new(&url).with_headers(headers))
        .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn forbidden_is_authentication() {
    let (url, _) = spawn(|_| StatusCode::FORBIDDEN.into_response()).await;
    let err = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::Authentication);
    assert_eq!(err.status_code, Some(403));
}

#[tokio::test]
async fn other_status_includes_body() {
    let (url, _) = spawn(|_| (StatusCode::BAD_REQUEST, "introspection is off").into_response()).await;
    let err = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::HttpStatus);
    assert_eq!(err.status_code, Some(400));
    assert_eq!(err.message, "Endpoint returned HTTP 400: introspection is off");
    assert_eq!(err.endpoint, url);
}

#[tokio::test]
async fn empty_error_body_falls_back_to_reason() {
    let (url, _) = spawn(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()).await;
    let err = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap_err();
    assert_eq!(err.message, "Endpoint returned HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn html_is_invalid_json() {
    let (url, _) = spawn(|_| "<html>hello</html>".into_response()).await;
    let err = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(&url))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::InvalidJson);
    assert_eq!(err.status_code, None);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let (url, hits) = spawn(|_| Json(serde_json::json!({ "data": {} })).into_response()).await;
    let introspector = introspector(Duration::from_secs(300));
    let options = IntrospectionOptions::new(&url);

    for _ in 0..2 {
        let err = introspector.introspect(&options).await.unwrap_err();
        assert_eq!(err.kind, IntrospectionErrorKind::MissingSchema);
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(introspector.cache().is_empty());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let app = Router::new().route(
        "/graphql",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let introspector = Introspector::new(
        Duration::from_millis(200),
        Arc::new(IntrospectionCache::default()),
    );
    let err = introspector
        .introspect(&IntrospectionOptions::new(format!("http://{addr}/graphql")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::Timeout);
    assert!(err.message.starts_with("Introspection request timed out after"));
}

#[tokio::test]
async fn refused_connection_is_network() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = introspector(Duration::from_secs(300))
        .introspect(&IntrospectionOptions::new(format!("http://{addr}/graphql")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, IntrospectionErrorKind::Network);
    assert!(err.message.starts_with("Failed to reach endpoint: "));
}
