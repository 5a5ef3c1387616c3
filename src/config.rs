use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::{LLMConfig, LLMProvider};
use crate::types::ResponseMode;

/// Configuration for the video chat assistant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote generation settings
    pub llm: LLMConfig,

    /// Metadata and transcription settings
    pub video: VideoConfig,

    /// Response composition settings
    pub chat: ChatConfig,

    /// Chat history persistence
    pub storage: StorageConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// YouTube Data API key. Without one, metadata is simulated.
    pub youtube_api_key: Option<String>,

    /// Artificial latency before each metadata and transcription step (ms)
    pub simulated_delay_ms: u64,

    /// Timeout for metadata requests (seconds)
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Mode used when none is requested
    pub default_mode: ResponseMode,

    /// TOML file overriding the built-in response templates
    pub templates_file: Option<PathBuf>,

    /// Fixed seed for template selection and confidence values
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory holding the chat history files
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the vidchat crate
    pub level: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            simulated_delay_ms: 500,
            request_timeout_seconds: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("vidchat"))
        .unwrap_or_else(|| PathBuf::from("./vidchat-data"))
}

/// Candidate config files, in lookup order
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("vidchat.toml"),
        PathBuf::from("config/vidchat.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("vidchat").join("config.toml"));
    }
    paths
}

impl Config {
    /// Load configuration from the first config file found, else from the environment
    pub fn load() -> Result<Self> {
        for path in config_paths() {
            if let Ok(config_str) = std::fs::read_to_string(&path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(api_key) = std::env::var("VIDCHAT_API_KEY") {
            config.llm.api_key = Some(api_key);
        }

        if let Ok(provider) = std::env::var("VIDCHAT_LLM_PROVIDER") {
            config.llm.provider = provider.parse::<LLMProvider>().map_err(|e| anyhow!(e))?;
        }

        if let Ok(model) = std::env::var("VIDCHAT_MODEL") {
            config.llm.model = model;
        }

        if let Ok(api_key) = std::env::var("VIDCHAT_YOUTUBE_API_KEY") {
            config.video.youtube_api_key = Some(api_key);
        }

        if let Ok(data_dir) = std::env::var("VIDCHAT_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(log_level) = std::env::var("VIDCHAT_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Ok(seed) = std::env::var("VIDCHAT_SEED") {
            config.chat.seed = seed.parse().ok();
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.llm.timeout_seconds == 0 {
            return Err(anyhow!("llm.timeout_seconds must be greater than 0"));
        }

        if self.llm.max_tokens == 0 || self.llm.brief_max_tokens == 0 {
            return Err(anyhow!("llm token budgets must be greater than 0"));
        }

        if self.video.request_timeout_seconds == 0 {
            return Err(anyhow!("video.request_timeout_seconds must be greater than 0"));
        }

        if self.storage.backend == StorageBackend::File
            && self.storage.data_dir.as_os_str().is_empty()
        {
            return Err(anyhow!("storage.data_dir is required for the file backend"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        let remote = match (&self.llm.provider, &self.llm.api_key, &self.llm.endpoint) {
            (LLMProvider::LMStudio, _, Some(endpoint)) => format!("LMStudio at {}", endpoint),
            (provider, Some(_), _) => format!("{:?} ({})", provider, self.llm.model),
            _ => "not configured (template answers)".to_string(),
        };

        format!(
            "VidChat Configuration:\n\
            - Remote Generation: {}\n\
            - Metadata: {}\n\
            - Default Mode: {}\n\
            - Templates: {}\n\
            - Storage: {:?} ({})\n\
            - Log Level: {}",
            remote,
            if self.video.youtube_api_key.is_some() {
                "YouTube Data API"
            } else {
                "simulated"
            },
            self.chat.default_mode.as_str(),
            self.chat
                .templates_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            self.storage.backend,
            self.storage.data_dir.display(),
            self.logging.level
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_llm_provider(mut self, provider: LLMProvider) -> Self {
        self.config.llm.provider = provider;
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.llm.api_key = Some(api_key);
        self
    }

    pub fn with_youtube_api_key(mut self, api_key: String) -> Self {
        self.config.video.youtube_api_key = Some(api_key);
        self
    }

    pub fn with_simulated_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.video.simulated_delay_ms = delay_ms;
        self
    }

    pub fn with_default_mode(mut self, mode: ResponseMode) -> Self {
        self.config.chat.default_mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.chat.seed = Some(seed);
        self
    }

    pub fn with_templates_file(mut self, path: PathBuf) -> Self {
        self.config.chat.templates_file = Some(path);
        self
    }

    pub fn with_memory_storage(mut self) -> Self {
        self.config.storage.backend = StorageBackend::Memory;
        self
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.backend = StorageBackend::File;
        self.config.storage.data_dir = dir;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
