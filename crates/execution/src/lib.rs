pub mod demo;
pub mod engine;
pub mod local;
pub mod remote;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use demo::{Catalog, CatalogResolver};
pub use engine::{PropertyResolver, ResolveInfo, Resolver};
pub use local::LocalBackend;
pub use remote::{RemoteBackend, DEFAULT_REMOTE_TIMEOUT};

/// Result of running one query: data, the first error message, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Runs an already-validated query against a schema or endpoint fixed at construction.
///
/// Failures are reported in the outcome, never as `Err`.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn execute(&self, query: &str) -> ExecutionOutcome;

    /// Short label for logs, e.g. `local` or the endpoint URL.
    fn describe(&self) -> String;
}
