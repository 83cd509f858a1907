use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";

/// Any OpenAI-compatible `/v1/chat/completions` API (OpenAI itself, OpenRouter, local gateways).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    extra_headers: Vec<(String, String)>,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            extra_headers: Vec::new(),
        }
    }

    /// OpenRouter with its attribution header.
    pub fn openrouter(api_key: String, model: String) -> Self {
        Self::new(api_key, model, OPENROUTER_BASE_URL.to_string()).with_header("X-Title", "nlgql")
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers.push((name.to_string(), value.to_string()));
        self
    }

    fn build_request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        })
    }
}

/// Pull the reply text out of a chat-completions response.
///
/// OpenRouter can answer 200 with an `error` object instead of choices.
fn parse_response(resp: &Value) -> Result<String, LlmError> {
    if let Some(message) = resp["error"]["message"].as_str() {
        return Err(LlmError::ApiError {
            status: resp["error"]["code"].as_u64().unwrap_or(200) as u16,
            body: message.to_string(),
        });
    }
    match &resp["choices"][0]["message"]["content"] {
        Value::String(s) => Ok(s.clone()),
        Value::Null if resp["choices"][0].is_object() => Ok(String::new()),
        _ => Err(LlmError::ParseError("missing choices[0].message.content".into())),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!("chat completion request to {} (model={})", url, self.model);

        let mut request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        for (name, value) in &self.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: Value = response.json().await?;
        parse_response(&resp)
    }
}
