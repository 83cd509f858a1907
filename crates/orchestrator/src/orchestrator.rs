//! Generate → validate → retry → execute → follow-up.

use std::sync::Arc;

use nlgql_execution::ExecutionBackend;
use nlgql_llm::{AiError, AiProvider};
use nlgql_schema::validate;
use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::context::{ActiveSchema, SchemaContext};
use crate::step::{AiQueryResponse, QueryStep, ValidationStatus};

/// Regeneration cycles allowed after the first candidate.
pub const MAX_RETRIES: u32 = 2;

const EMPTY_OUTPUT: &str = "AI provider returned an empty response";

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("AI provider failed: {0}")]
    Provider(#[from] AiError),
}

/// True when provider output reads as GraphQL rather than prose.
///
/// Besides the operation prefixes, a bare selection such as `products { id }`
/// or `product(id: 1) { name }` counts as a (malformed) query so that it goes
/// through validation and retry.
pub fn looks_like_graphql(text: &str) -> bool {
    let text = text.trim();
    if ["{", "query", "mutation", "subscription"]
        .iter()
        .any(|prefix| text.starts_with(prefix))
    {
        return true;
    }

    let Some(rest) = strip_name(text) else {
        return false;
    };
    if rest.trim_start().starts_with('{') {
        return true;
    }
    // `name(arg:` with no space before the parenthesis.
    rest.strip_prefix('(')
        .and_then(|args| strip_name(args.trim_start()))
        .is_some_and(|after| after.trim_start().starts_with(':'))
}

/// Strips a leading GraphQL name, returning the remainder.
fn strip_name(text: &str) -> Option<&str> {
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    (len > 0).then(|| &text[len..])
}

pub struct QueryOrchestrator {
    provider: Arc<dyn AiProvider>,
    max_retries: u32,
}

impl QueryOrchestrator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self {
            provider,
            max_retries: MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run against a snapshot of the context's active schema.
    pub async fn run_in(
        &self,
        context: &SchemaContext,
        natural_language: &str,
    ) -> Result<AiQueryResponse, OrchestrationError> {
        let active = context.snapshot();
        let backend = context.backend_for(&active);
        self.run(natural_language, &active, backend.as_ref()).await
    }

    pub async fn run(
        &self,
        natural_language: &str,
        active: &ActiveSchema,
        backend: &dyn ExecutionBackend,
    ) -> Result<AiQueryResponse, OrchestrationError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("ai_query", %request_id, backend = %backend.describe());

        async move {
            info!("orchestrating: {}", natural_language);

            let primary = self.primary_step(natural_language, active, backend).await?;
            info!(
                status = ?primary.validation_status,
                retries = primary.retry_count,
                "primary step finished"
            );

            if primary.validation_status == ValidationStatus::Invalid {
                return Ok(AiQueryResponse::from_steps(primary, None));
            }

            let follow_up = match &primary.result {
                Some(result) if !result.is_null() => {
                    self.follow_up_step(&primary.query, result, active, backend).await
                }
                _ => None,
            };
            Ok(AiQueryResponse::from_steps(primary, follow_up))
        }
        .instrument(span)
        .await
    }

    async fn primary_step(
        &self,
        natural_language: &str,
        active: &ActiveSchema,
        backend: &dyn ExecutionBackend,
    ) -> Result<QueryStep, OrchestrationError> {
        let mut last_errors: Vec<String> = Vec::new();
        let mut candidate = String::new();

        for attempt in 0..=self.max_retries {
            let previous = (!last_errors.is_empty()).then_some(last_errors.as_slice());
            let output = self
                .provider
                .generate_query(natural_language, &active.sdl, &active.analysis, previous)
                .await?;
            candidate = output.trim().to_string();
            debug!(attempt, "candidate: {}", candidate);

            if candidate.is_empty() {
                last_errors = vec![EMPTY_OUTPUT.to_string()];
                continue;
            }

            if !looks_like_graphql(&candidate) {
                info!(attempt, "request is out of scope for the schema");
                return Ok(QueryStep::out_of_scope(candidate, attempt));
            }

            let outcome = validate(&active.schema, &candidate);
            if outcome.valid {
                let status = if attempt == 0 {
                    ValidationStatus::Valid
                } else {
                    ValidationStatus::Corrected
                };
                let executed = backend.execute(&candidate).await;
                return Ok(QueryStep::executed(
                    candidate,
                    status,
                    executed.data,
                    executed.error,
                    attempt,
                ));
            }

            last_errors = outcome.messages();
            info!(attempt, errors = last_errors.len(), "candidate failed validation");
        }

        Ok(QueryStep::invalid(
            candidate,
            format!(
                "Validation failed after {} retries: {}",
                self.max_retries,
                last_errors.join(", ")
            ),
            self.max_retries,
        ))
    }

    /// Best effort: provider failures end the pipeline without touching the primary step.
    async fn follow_up_step(
        &self,
        query: &str,
        result: &Value,
        active: &ActiveSchema,
        backend: &dyn ExecutionBackend,
    ) -> Option<QueryStep> {
        let candidate = match self
            .provider
            .suggest_follow_up(query, result, &active.analysis)
            .await
        {
            Ok(Some(candidate)) => candidate.trim().to_string(),
            Ok(None) => {
                debug!("no follow-up suggested");
                return None;
            }
            Err(e) => {
                warn!("follow-up suggestion failed: {}", e);
                return None;
            }
        };
        if candidate.is_empty() {
            return None;
        }

        let outcome = validate(&active.schema, &candidate);
        if !outcome.valid {
            info!("follow-up candidate failed validation");
            return Some(QueryStep::invalid(
                candidate,
                format!(
                    "Follow-up query validation failed: {}",
                    outcome.messages().join(", ")
                ),
                0,
            ));
        }

        let executed = backend.execute(&candidate).await;
        info!("follow-up executed");
        Some(QueryStep::executed(
            candidate,
            ValidationStatus::Valid,
            executed.data,
            executed.error,
            0,
        ))
    }
}
