pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::types::ResponseMode;

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    LMStudio,
    Gemini,
    OpenAI,
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lmstudio" | "lm-studio" | "lm_studio" => Ok(LLMProvider::LMStudio),
            "gemini" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            other => Err(format!("Unknown LLM provider: {}", other)),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    /// Token budget for detailed answers
    pub max_tokens: u32,
    /// Token budget for brief answers
    pub brief_max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            brief_max_tokens: 150,
            temperature: 0.7,
            timeout_seconds: 60,
        }
    }
}

impl LLMConfig {
    pub fn max_tokens_for(&self, mode: ResponseMode) -> u32 {
        match mode {
            ResponseMode::Brief => self.brief_max_tokens,
            ResponseMode::Detailed => self.max_tokens,
        }
    }
}

/// Remote generation failures. Callers recover from all of them.
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Remote generator is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from remote generator")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Message for chat-completion style APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Free-text generation from a prompt
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    /// Whether a credential (or local endpoint) is available
    fn is_configured(&self) -> bool;

    /// One attempt, no retries
    async fn generate(&self, prompt: &str, mode: ResponseMode) -> Result<String>;
}

/// System instruction per response mode
pub fn system_prompt(mode: ResponseMode) -> &'static str {
    match mode {
        ResponseMode::Brief => {
            "You are a helpful assistant that answers questions about a video using its \
             transcript. Reply in at most two short sentences."
        }
        ResponseMode::Detailed => {
            "You are a helpful assistant that answers questions about a video using its \
             transcript. Give a thorough, well structured answer and reference timestamps."
        }
    }
}

/// Create a remote generator based on configuration
pub fn create_generator(config: &LLMConfig) -> Result<Arc<dyn RemoteGenerator>> {
    match config.provider {
        LLMProvider::LMStudio => Ok(Arc::new(providers::LMStudioProvider::new(config.clone())?)),
        LLMProvider::Gemini => Ok(Arc::new(providers::GeminiProvider::new(config.clone())?)),
        LLMProvider::OpenAI => Ok(Arc::new(providers::OpenAIProvider::new(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!("Gemini".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("lm-studio".parse::<LLMProvider>().unwrap(), LLMProvider::LMStudio);
        assert!("claude".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_token_budget_per_mode() {
        let config = LLMConfig::default();
        assert_eq!(config.max_tokens_for(ResponseMode::Brief), 150);
        assert_eq!(config.max_tokens_for(ResponseMode::Detailed), 1024);
    }

    #[test]
    fn test_default_generator_is_not_configured() {
        let generator = create_generator(&LLMConfig::default()).unwrap();
        assert!(!generator.is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_generator_refuses() {
        let generator = create_generator(&LLMConfig::default()).unwrap();
        let result = generator.generate("hello", ResponseMode::Brief).await;
        assert!(matches!(result, Err(LLMError::NotConfigured)));
    }
}
