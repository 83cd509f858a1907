use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use nlgql_schema::introspect::json_headers;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ExecutionBackend, ExecutionOutcome};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Proxies queries to a connected GraphQL endpoint over HTTP POST.
pub struct RemoteBackend {
    client: reqwest::Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Duration,
}

impl RemoteBackend {
    pub fn new(endpoint: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            headers,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post(&self, query: &str) -> Result<ExecutionOutcome, reqwest::Error> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(json_headers(&self.headers))
            .json(&serde_json::json!({ "query": query }))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ExecutionOutcome::failed(format!(
                "External endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await?;
        let data = body.get("data").filter(|d| !d.is_null()).cloned();
        let error = body
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ExecutionOutcome { data, error })
    }
}

#[async_trait]
impl ExecutionBackend for RemoteBackend {
    async fn execute(&self, query: &str) -> ExecutionOutcome {
        debug!(endpoint = %self.endpoint, "proxying query");
        match self.post(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "remote execution failed");
                ExecutionOutcome::failed(format!("Failed to execute against external endpoint: {e}"))
            }
        }
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
