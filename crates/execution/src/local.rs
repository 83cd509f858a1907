use std::sync::Arc;

use async_trait::async_trait;
use nlgql_schema::apollo_compiler::validation::Valid;
use nlgql_schema::apollo_compiler::Schema;
use tracing::debug;

use crate::engine::{self, Resolver};
use crate::{ExecutionBackend, ExecutionOutcome};

/// Executes in-process against a schema and a [`Resolver`].
pub struct LocalBackend {
    schema: Arc<Valid<Schema>>,
    resolver: Arc<dyn Resolver>,
}

impl LocalBackend {
    pub fn new(schema: Arc<Valid<Schema>>, resolver: Arc<dyn Resolver>) -> Self {
        Self { schema, resolver }
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    async fn execute(&self, query: &str) -> ExecutionOutcome {
        let document = match nlgql_schema::validated_document(&self.schema, query) {
            Ok(doc) => doc,
            Err(outcome) => {
                let message = outcome
                    .messages()
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "Query failed validation".to_string());
                return ExecutionOutcome::failed(message);
            }
        };

        let response = engine::execute(&self.schema, &document, self.resolver.as_ref());
        debug!(errors = response.errors.len(), "local execution finished");

        ExecutionOutcome {
            data: response.data.filter(|d| !d.is_null()),
            error: response.errors.into_iter().next().map(|e| e.message),
        }
    }

    fn describe(&self) -> String {
        "local".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::CatalogResolver;
    use serde_json::json;

    fn backend() -> LocalBackend {
        let schema = nlgql_schema::builtin_schema().unwrap();
        LocalBackend::new(Arc::new(schema), Arc::new(CatalogResolver::sample().unwrap()))
    }

    #[tokio::test]
    async fn returns_data() {
        let outcome = backend().execute("{ categories { name } }").await;
        assert!(outcome.error.is_none());
        assert_eq!(outcome.data.unwrap()["categories"][3], json!({ "name": "Books" }));
    }

    #[tokio::test]
    async fn null_root_data_is_no_data() {
        let outcome = backend()
            .execute(r#"mutation { a: cancelOrder(id: "nope") { id } }"#)
            .await;
        assert_eq!(outcome.error.as_deref(), Some("Order nope not found"));
        assert_eq!(outcome.data, None);
    }

    #[tokio::test]
    async fn invalid_query_is_an_error_outcome() {
        let outcome = backend().execute("{ nope }").await;
        assert!(outcome.data.is_none());
        assert!(outcome.error.unwrap().contains("nope"));
    }
}
