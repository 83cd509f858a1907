use async_trait::async_trait;
use nlgql_core::Config;
use nlgql_schema::{render_context, SchemaAnalysis};
use serde_json::Value;
use tracing::{debug, info};

use crate::provider::{LlmError, LlmProvider, Message};

const GENERATE_QUERY_TEMPLATE: &str = include_str!("../prompts/generate-query.md");
const FOLLOW_UP_TEMPLATE: &str = include_str!("../prompts/follow-up.md");

/// Placeholder in each template that gets replaced with the schema overview.
const SCHEMA_PLACEHOLDER: &str = "<<<schema>>>";

const SCHEMA_ACK: &str = "Understood. I will output a query if the request matches the schema, \
                          or explain what data is available if it does not.";

/// Results longer than this are cut before being shown to the model.
const MAX_RESULT_CHARS: usize = 4000;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("prompt template error: {0}")]
    Template(String),
}

/// Turns natural language into GraphQL and proposes follow-up queries.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable provider label for logs and `/health`.
    fn name(&self) -> &str;

    /// Candidate query text, or a plain-language explanation when the request is
    /// out of scope. `previous_errors` carries the validation messages of the
    /// previous attempt on a retry.
    async fn generate_query(
        &self,
        natural_language: &str,
        schema_sdl: &str,
        analysis: &SchemaAnalysis,
        previous_errors: Option<&[String]>,
    ) -> Result<String, AiError>;

    /// A complementary query for an executed one, or `None`.
    async fn suggest_follow_up(
        &self,
        original_query: &str,
        result: &Value,
        analysis: &SchemaAnalysis,
    ) -> Result<Option<String>, AiError>;
}

// ── Chat-completion adapter ───────────────────────────────────

/// [`AiProvider`] over any chat-completion [`LlmProvider`].
pub struct ChatAiProvider {
    provider: Box<dyn LlmProvider>,
    name: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatAiProvider {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        name: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            name: name.into(),
            temperature,
            max_tokens,
        }
    }

    /// Build from config, creating the provider named by `LLM_PROVIDER`.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let provider = crate::providers::create_provider(&config.llm, &config.ollama)?;
        let name = format!(
            "{} ({})",
            config.llm.provider,
            config.llm.active_model(&config.ollama)
        );
        Ok(Self::new(
            provider,
            name,
            config.llm.temperature,
            config.llm.max_tokens,
        ))
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String, AiError> {
        let response = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        debug!("LLM response: {}", response);
        Ok(strip_code_fence(&response).to_string())
    }
}

#[async_trait]
impl AiProvider for ChatAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_query(
        &self,
        natural_language: &str,
        schema_sdl: &str,
        analysis: &SchemaAnalysis,
        previous_errors: Option<&[String]>,
    ) -> Result<String, AiError> {
        let system = fill_template(GENERATE_QUERY_TEMPLATE, &render_context(analysis))?;

        let request = match previous_errors {
            Some(errors) if !errors.is_empty() => format!(
                "{natural_language}\n\n(Previous attempt had errors: {}. Fix them.)",
                errors.join(", ")
            ),
            _ => natural_language.to_string(),
        };

        info!("Generating query for: {}", natural_language);

        let messages = vec![
            Message::system(system),
            Message::user(format!("GraphQL schema:\n\n{schema_sdl}")),
            Message::assistant(SCHEMA_ACK),
            Message::user(request),
        ];
        self.complete(messages).await
    }

    async fn suggest_follow_up(
        &self,
        original_query: &str,
        result: &Value,
        analysis: &SchemaAnalysis,
    ) -> Result<Option<String>, AiError> {
        let system = fill_template(FOLLOW_UP_TEMPLATE, &render_context(analysis))?;
        let result_json = serde_json::to_string(result).unwrap_or_default();

        let messages = vec![
            Message::system(system),
            Message::user(format!(
                "Executed query:\n\n{original_query}\n\nResult:\n\n{}",
                truncate_chars(&result_json, MAX_RESULT_CHARS)
            )),
        ];

        let answer = self.complete(messages).await?;
        Ok(parse_follow_up(&answer))
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Substitute the schema overview, requiring exactly one placeholder.
fn fill_template(template: &str, schema: &str) -> Result<String, AiError> {
    let count = template.matches(SCHEMA_PLACEHOLDER).count();
    if count != 1 {
        return Err(AiError::Template(format!(
            "template must contain exactly one '{SCHEMA_PLACEHOLDER}' placeholder, found {count}"
        )));
    }
    Ok(template.replace(SCHEMA_PLACEHOLDER, schema))
}

/// Trim and remove a surrounding markdown code fence (```graphql ... ```).
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening line.
    let body = match after_open.find('\n') {
        Some(n) => &after_open[n + 1..],
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn parse_follow_up(answer: &str) -> Option<String> {
    let lowered = answer.trim().to_lowercase();
    if lowered.is_empty() || lowered == "none" || lowered.starts_with("no follow-up") {
        return None;
    }
    Some(answer.trim().to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
