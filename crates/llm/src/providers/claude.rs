use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{split_system, LlmError, LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// The Messages API takes the system prompt as a top-level field.
    fn build_request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        let (system, rest) = split_system(messages);

        let api_messages: Vec<Value> = rest
            .iter()
            .map(|m| {
                let role = if m.role == Role::Assistant { "assistant" } else { "user" };
                json!({ "role": role, "content": m.content })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        if let Some(system) = system {
            body["system"] = json!(system);
        }
        body
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!("Claude request (model={})", self.model);

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        // Concatenate text blocks; a reply may be split across several.
        let blocks = resp["content"]
            .as_array()
            .ok_or_else(|| LlmError::ParseError("missing content array".into()))?;
        Ok(blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect())
    }
}
