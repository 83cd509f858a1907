pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

use nlgql_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider};

fn require_key<'a>(key: &'a Option<String>, var: &str) -> Result<&'a str, LlmError> {
    key.as_deref()
        .ok_or_else(|| LlmError::NotConfigured(format!("{var} not set")))
}

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = require_key(&llm_config.openai_api_key, "OPENAI_API_KEY")?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or(openai::OPENAI_BASE_URL);
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.to_string(),
                llm_config.openai_model.clone(),
                base_url.to_string(),
            )))
        }
        "openrouter" => {
            let api_key = require_key(&llm_config.openrouter_api_key, "OPENROUTER_API_KEY")?;
            Ok(Box::new(openai::OpenAiProvider::openrouter(
                api_key.to_string(),
                llm_config.openrouter_model.clone(),
            )))
        }
        "anthropic" | "claude" => {
            let api_key = require_key(&llm_config.anthropic_api_key, "ANTHROPIC_API_KEY")?;
            Ok(Box::new(claude::ClaudeProvider::new(
                api_key.to_string(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "gemini" => {
            let api_key = require_key(&llm_config.gemini_api_key, "GEMINI_API_KEY")?;
            Ok(Box::new(gemini::GeminiProvider::new(
                api_key.to_string(),
                llm_config.gemini_model.clone(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            ollama_config.url.clone(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
