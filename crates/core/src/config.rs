//! Configuration management for sitechat.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables (`SITECHAT_*`)
//! - Command-line flags
//! - Config files (sitechat.yaml)
//!
//! Precedence, lowest to highest: defaults, config file, environment,
//! CLI flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global options that affect both the relay server
/// and the chat client side of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the completion provider API
    pub endpoint: String,

    /// Model identifier sent to the provider
    pub model: String,

    /// Provider API credential, if resolved
    pub api_key: Option<String>,

    /// Environment variable holding the provider credential
    pub api_key_env: String,

    /// Sampling temperature for completions
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// URL of the knowledge document source (flat JSON array)
    pub knowledge_url: String,

    /// Number of knowledge entries retrieved per query
    pub top_k: usize,

    /// Capacity of the retrieval query cache
    pub cache_capacity: usize,

    /// Seconds to wait for the next stream chunk before timing out
    pub stream_read_timeout_secs: u64,

    /// Bind address for the relay HTTP server
    pub bind: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<ProviderSection>,
    retrieval: Option<RetrievalSection>,
    server: Option<ServerSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderSection {
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    temperature: Option<f32>,
    #[serde(rename = "maxTokens")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "knowledgeUrl")]
    knowledge_url: Option<String>,
    #[serde(rename = "topK")]
    top_k: Option<usize>,
    #[serde(rename = "cacheCapacity")]
    cache_capacity: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
    #[serde(rename = "streamReadTimeoutSecs")]
    stream_read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "SITECHAT_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 600,
            knowledge_url: "http://localhost:3000/api/knowledge".to_string(),
            top_k: 3,
            cache_capacity: 256,
            stream_read_timeout_secs: 30,
            bind: "127.0.0.1:8787".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SITECHAT_CONFIG`: Path to config file
    /// - `SITECHAT_ENDPOINT`: Completion provider base URL
    /// - `SITECHAT_MODEL`: Model identifier
    /// - `SITECHAT_API_KEY`: Provider credential
    /// - `SITECHAT_KNOWLEDGE_URL`: Knowledge document source URL
    /// - `SITECHAT_BIND`: Relay server bind address
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("SITECHAT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if one was named
        if let Some(path) = config.config_file.clone() {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file does not exist: {:?}",
                    path
                )));
            }
            config = config.merge_yaml(&path)?;
        }

        // Environment variables override YAML config
        if let Ok(endpoint) = std::env::var("SITECHAT_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("SITECHAT_MODEL") {
            config.model = model;
        }

        if let Ok(knowledge_url) = std::env::var("SITECHAT_KNOWLEDGE_URL") {
            config.knowledge_url = knowledge_url;
        }

        if let Ok(bind) = std::env::var("SITECHAT_BIND") {
            config.bind = bind;
        }

        config.api_key = std::env::var(&config.api_key_env).ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            if let Some(endpoint) = provider.endpoint {
                result.endpoint = endpoint;
            }
            if let Some(model) = provider.model {
                result.model = model;
            }
            if let Some(api_key_env) = provider.api_key_env {
                result.api_key_env = api_key_env;
            }
            if let Some(temperature) = provider.temperature {
                result.temperature = temperature;
            }
            if let Some(max_tokens) = provider.max_tokens {
                result.max_tokens = max_tokens;
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(knowledge_url) = retrieval.knowledge_url {
                result.knowledge_url = knowledge_url;
            }
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
            if let Some(cache_capacity) = retrieval.cache_capacity {
                result.cache_capacity = cache_capacity;
            }
        }

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.bind = bind;
            }
            if let Some(secs) = server.stream_read_timeout_secs {
                result.stream_read_timeout_secs = secs;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    pub fn with_overrides(
        mut self,
        config_file: Option<PathBuf>,
        endpoint: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the provider API credential.
    ///
    /// Checks the already-resolved `api_key` first, then the environment
    /// variable named by `api_key_env`. Returns `None` if neither is set;
    /// the relay treats that as a request-time configuration error.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        std::env::var(&self.api_key_env).ok()
    }

    /// Validate configuration values that would otherwise fail deep inside
    /// a request.
    pub fn validate(&self) -> AppResult<()> {
        if self.endpoint.is_empty() {
            return Err(AppError::Config("Provider endpoint is empty".to_string()));
        }

        if self.top_k == 0 {
            return Err(AppError::Config(
                "Retrieval top_k must be at least 1".to_string(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(AppError::Config(
                "Query cache capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
