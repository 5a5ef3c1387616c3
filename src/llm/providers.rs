use super::{system_prompt, LLMConfig, LLMError, PromptMessage, RemoteGenerator, Result};
use crate::types::ResponseMode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const LMSTUDIO_URL: &str = "http://localhost:1234/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

fn build_client(config: &LLMConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .build()?)
}

fn has_key(config: &LLMConfig) -> bool {
    config
        .api_key
        .as_deref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(LLMError::Api { status, body })
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<PromptMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: PromptMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    total_tokens: u32,
}

impl ChatCompletionRequest {
    fn new(config: &LLMConfig, prompt: &str, mode: ResponseMode) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                PromptMessage::system(system_prompt(mode)),
                PromptMessage::user(prompt),
            ],
            max_tokens: config.max_tokens_for(mode),
            temperature: config.temperature,
        }
    }
}

fn first_choice(response: ChatCompletionResponse) -> Result<String> {
    if let Some(usage) = &response.usage {
        debug!("Remote generation used {} tokens", usage.total_tokens);
    }
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LLMError::EmptyResponse)
}

/// LMStudio provider implementation (OpenAI compatible local server)
pub struct LMStudioProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl LMStudioProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(LMSTUDIO_URL)
    }
}

#[async_trait]
impl RemoteGenerator for LMStudioProvider {
    fn is_configured(&self) -> bool {
        // a local server needs no key, an explicit endpoint opts in
        self.config.endpoint.is_some()
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> Result<String> {
        if !self.is_configured() {
            return Err(LLMError::NotConfigured);
        }

        let request = ChatCompletionRequest::new(&self.config, prompt, mode);
        let endpoint = self.endpoint();
        debug!("Sending request to LMStudio at {}", endpoint);

        let response = self.client.post(endpoint).json(&request).send().await?;
        let response = check_status(response).await?;

        first_choice(response.json().await?)
    }
}

/// Gemini provider implementation
pub struct GeminiProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: u32,
}

impl GeminiContent {
    fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![GeminiPart { text: text.into() }],
        }
    }
}

impl GeminiProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl RemoteGenerator for GeminiProvider {
    fn is_configured(&self) -> bool {
        has_key(&self.config)
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> Result<String> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(LLMError::NotConfigured),
        };

        let request = GeminiRequest {
            contents: vec![GeminiContent::text(prompt)],
            system_instruction: GeminiContent::text(system_prompt(mode)),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens_for(mode),
                temperature: self.config.temperature,
            },
        };

        let base = self.config.endpoint.as_deref().unwrap_or(GEMINI_BASE_URL);
        let url = format!("{}/{}:generateContent", base, self.config.model);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let gemini_response: GeminiResponse = response.json().await?;
        if let Some(usage) = &gemini_response.usage_metadata {
            debug!("Remote generation used {} tokens", usage.total_token_count);
        }

        gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LLMError::EmptyResponse)
    }
}

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl RemoteGenerator for OpenAIProvider {
    fn is_configured(&self) -> bool {
        has_key(&self.config)
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> Result<String> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(LLMError::NotConfigured),
        };

        let request = ChatCompletionRequest::new(&self.config, prompt, mode);
        let url = self.config.endpoint.as_deref().unwrap_or(OPENAI_URL);

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        first_choice(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMProvider;

    #[test]
    fn test_request_uses_mode_budget() {
        let config = LLMConfig::default();
        let brief = ChatCompletionRequest::new(&config, "q", ResponseMode::Brief);
        let detailed = ChatCompletionRequest::new(&config, "q", ResponseMode::Detailed);

        assert_eq!(brief.max_tokens, config.brief_max_tokens);
        assert_eq!(detailed.max_tokens, config.max_tokens);
        assert_eq!(brief.messages[0].role, "system");
        assert_eq!(brief.messages[1].content, "q");
    }

    #[test]
    fn test_first_choice_rejects_blank() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#,
        )
        .unwrap();
        assert!(matches!(first_choice(response), Err(LLMError::EmptyResponse)));

        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}],"usage":{"total_tokens":7}}"#,
        )
        .unwrap();
        assert_eq!(first_choice(response).unwrap(), "Hi");
    }

    #[test]
    fn test_configured_flags() {
        let mut config = LLMConfig {
            api_key: Some("   ".to_string()),
            ..LLMConfig::default()
        };
        assert!(!OpenAIProvider::new(config.clone()).unwrap().is_configured());

        config.api_key = Some("sk-test".to_string());
        assert!(OpenAIProvider::new(config.clone()).unwrap().is_configured());
        assert!(GeminiProvider::new(config.clone()).unwrap().is_configured());

        config.provider = LLMProvider::LMStudio;
        assert!(!LMStudioProvider::new(config.clone()).unwrap().is_configured());
        config.endpoint = Some(LMSTUDIO_URL.to_string());
        assert!(LMStudioProvider::new(config).unwrap().is_configured());
    }
}
