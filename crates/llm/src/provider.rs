use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-style chat APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A chat-completion backend. Each vendor API implements this.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the assistant's response text.
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// Split off the first system message, as the Anthropic and Gemini APIs want it separately.
pub(crate) fn split_system(messages: &[Message]) -> (Option<&str>, Vec<&Message>) {
    let system = messages
        .iter()
        .find(|m| m.role == Role::System)
        .map(|m| m.content.as_str());
    let rest = messages.iter().filter(|m| m.role != Role::System).collect();
    (system, rest)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued replies in order and records every request.
    #[derive(Default)]
    pub struct MockLlmProvider {
        replies: Mutex<VecDeque<Result<String, String>>>,
        requests: Mutex<Vec<Vec<Message>>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a reply for the next call.
        pub fn queue_text(&self, text: &str) {
            self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        }

        /// Queue an API failure for the next call.
        pub fn queue_error(&self, body: &str) {
            self.replies.lock().unwrap().push_back(Err(body.to_string()));
        }

        pub fn requests(&self) -> Vec<Vec<Message>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(messages);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(body)) => Err(LlmError::ApiError { status: 500, body }),
                None => Ok(String::new()),
            }
        }
    }
}
