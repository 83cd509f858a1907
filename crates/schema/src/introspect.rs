//! Remote schema discovery over the standard introspection query.

mod cache;
mod convert;
mod error;
mod query;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use apollo_compiler::validation::Valid;
use apollo_compiler::Schema;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info, warn};

pub use cache::{IntrospectionCache, DEFAULT_TTL};
pub use error::{IntrospectionError, IntrospectionErrorKind};
pub use query::INTROSPECTION_QUERY;

use convert::IntrospectionSchema;

/// Default bound on a single introspection request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct IntrospectionOptions {
    pub endpoint: String,
    /// Extra request headers (auth tokens, API keys). Override the JSON defaults.
    pub headers: HashMap<String, String>,
}

impl IntrospectionOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: HashMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }
}

/// A remote schema, validated and printed back to canonical SDL.
pub struct IntrospectionResult {
    pub schema: Arc<Valid<Schema>>,
    pub sdl: String,
    pub endpoint: String,
    pub fetched_at: DateTime<Utc>,
}

impl fmt::Debug for IntrospectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrospectionResult")
            .field("endpoint", &self.endpoint)
            .field("fetched_at", &self.fetched_at)
            .field("sdl_len", &self.sdl.len())
            .finish()
    }
}

/// JSON request headers with caller-supplied headers layered on top.
///
/// Header names or values that are not valid HTTP are skipped with a warning.
pub fn json_headers(extra: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in extra {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid request header"),
        }
    }
    headers
}

/// Fetches remote schemas and remembers them for the cache TTL.
pub struct Introspector {
    client: reqwest::Client,
    timeout: Duration,
    cache: Arc<IntrospectionCache>,
}

impl Default for Introspector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, Arc::new(IntrospectionCache::default()))
    }
}

impl Introspector {
    pub fn new(timeout: Duration, cache: Arc<IntrospectionCache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<IntrospectionCache> {
        &self.cache
    }

    /// Return the cached schema for the endpoint, or fetch, convert and cache it.
    pub async fn introspect(
        &self,
        options: &IntrospectionOptions,
    ) -> Result<Arc<IntrospectionResult>, IntrospectionError> {
        let endpoint = options.endpoint.as_str();

        if let Some(cached) = self.cache.get(endpoint) {
            debug!(endpoint, "introspection cache hit");
            return Ok(cached);
        }

        info!(endpoint, "introspecting endpoint");
        let payload = self.fetch(options).await?;
        let result = Arc::new(build_result(endpoint, &payload)?);
        self.cache.insert(Arc::clone(&result));

        info!(
            endpoint,
            types = result.schema.types.len(),
            "endpoint schema cached"
        );
        Ok(result)
    }

    async fn fetch(&self, options: &IntrospectionOptions) -> Result<Value, IntrospectionError> {
        use IntrospectionErrorKind as Kind;

        let endpoint = options.endpoint.as_str();
        let body = serde_json::json!({ "query": INTROSPECTION_QUERY });

        let response = self
            .client
            .post(endpoint)
            .headers(json_headers(&options.headers))
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntrospectionError::new(
                        Kind::Timeout,
                        endpoint,
                        format!(
                            "Introspection request timed out after {}s",
                            self.timeout.as_secs()
                        ),
                    )
                } else {
                    IntrospectionError::new(
                        Kind::Network,
                        endpoint,
                        format!("Failed to reach endpoint: {e}"),
                    )
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            if code == 401 || code == 403 {
                return Err(IntrospectionError::new(
                    Kind::Authentication,
                    endpoint,
                    format!("Authentication failed (HTTP {code}). Check your headers / API key."),
                )
                .with_status(code));
            }

            // Some APIs answer 400 when introspection is disabled; the body says why.
            let text = response.text().await.unwrap_or_default();
            let detail = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(IntrospectionError::new(
                Kind::HttpStatus,
                endpoint,
                format!("Endpoint returned HTTP {code}: {detail}"),
            )
            .with_status(code));
        }

        let bytes = response.bytes().await.map_err(|e| {
            IntrospectionError::new(
                Kind::Network,
                endpoint,
                format!("Failed to reach endpoint: {e}"),
            )
        })?;

        serde_json::from_slice(&bytes).map_err(|_| {
            IntrospectionError::new(
                Kind::InvalidJson,
                endpoint,
                "Response is not valid JSON. The endpoint may not be a GraphQL server.",
            )
        })
    }
}

/// Interpret an introspection response body.
fn build_result(endpoint: &str, payload: &Value) -> Result<IntrospectionResult, IntrospectionError> {
    use IntrospectionErrorKind as Kind;

    let data = payload.get("data").filter(|d| !d.is_null());

    if data.is_none() {
        if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
            let messages: Vec<&str> = errors
                .as_array()
                .map(|list| {
                    list.iter()
                        .map(|e| {
                            e.get("message")
                                .and_then(Value::as_str)
                                .unwrap_or("Unknown error")
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Err(IntrospectionError::new(
                Kind::QueryErrors,
                endpoint,
                format!(
                    "Introspection query returned errors: {}. Introspection may be disabled on this endpoint.",
                    messages.join("; ")
                ),
            ));
        }
    }

    let raw = data
        .and_then(|d| d.get("__schema"))
        .filter(|s| !s.is_null())
        .ok_or_else(|| {
            IntrospectionError::new(
                Kind::MissingSchema,
                endpoint,
                "Response does not contain introspection data. The endpoint may not support introspection.",
            )
        })?;

    let build_error = |cause: String| {
        IntrospectionError::new(
            Kind::SchemaBuild,
            endpoint,
            format!("Failed to build schema from introspection data: {cause}"),
        )
    };

    let parsed: IntrospectionSchema =
        serde_json::from_value(raw.clone()).map_err(|e| build_error(e.to_string()))?;
    let sdl = convert::to_sdl(&parsed).map_err(build_error)?;
    let schema = crate::parse_sdl(&sdl, "introspection.graphql").map_err(|e| build_error(e.to_string()))?;

    Ok(IntrospectionResult {
        sdl: schema.to_string(),
        schema: Arc::new(schema),
        endpoint: endpoint.to_string(),
        fetched_at: Utc::now(),
    })
}
