//! Configuration for the response evaluator.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default price charged per token, in USD.
pub const DEFAULT_PRICE_PER_TOKEN: f64 = 0.00002;

/// Default sentence-transformers model used for relevance embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "gpt-4o-mini")
    pub model: String,

    /// Maximum tokens for response (optional)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation (optional)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// USD charged per generated token.
    pub price_per_token: f64,

    /// Hugging Face model id for the embedding model.
    pub embedding_model: String,

    /// Upper bound on a single generation call. `None` waits indefinitely.
    #[serde(default)]
    pub generation_timeout_secs: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            price_per_token: DEFAULT_PRICE_PER_TOKEN,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_timeout_secs: None,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings
    pub llm: LlmConfig,
    /// Scoring settings
    pub eval: EvalConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    eval: Option<EvalFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct EvalFileSection {
    price_per_token: Option<f64>,
    embedding_model: Option<String>,
    generation_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_*, RAG_EVAL_*)
    /// 2. Config file (~/.config/rag-response-eval/config.yaml)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                config = Self::load_from_file(&config_path)?;
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_base) = env::var("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Ok(api_key) = env::var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Ok(max_tokens) = env::var("LLM_MAX_TOKENS") {
            if let Ok(tokens) = max_tokens.parse() {
                self.llm.max_tokens = tokens;
            }
        }

        if let Ok(temperature) = env::var("LLM_TEMPERATURE") {
            if let Ok(temp) = temperature.parse() {
                self.llm.temperature = temp;
            }
        }

        if let Ok(price) = env::var("RAG_EVAL_PRICE_PER_TOKEN") {
            if let Ok(price) = price.parse() {
                self.eval.price_per_token = price;
            }
        }

        if let Ok(model) = env::var("RAG_EVAL_EMBEDDING_MODEL") {
            self.eval.embedding_model = model;
        }

        if let Ok(timeout) = env::var("RAG_EVAL_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                self.eval.generation_timeout_secs = Some(secs);
            }
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        Self::from_yaml(&content)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
        }

        if let Some(eval) = file_config.eval {
            if let Some(price) = eval.price_per_token {
                config.eval.price_per_token = price;
            }
            if let Some(model) = eval.embedding_model {
                config.eval.embedding_model = model;
            }
            if eval.generation_timeout_secs.is_some() {
                config.eval.generation_timeout_secs = eval.generation_timeout_secs;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "rag-response-eval")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(EvalError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(EvalError::Config(
                "LLM API key is required. Set LLM_API_KEY environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(EvalError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if !self.eval.price_per_token.is_finite() || self.eval.price_per_token < 0.0 {
            return Err(EvalError::Config(format!(
                "Price per token must be a non-negative number, got {}",
                self.eval.price_per_token
            )));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            eval: EvalConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.api_base, "https://api.openai.com");
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.eval.price_per_token, DEFAULT_PRICE_PER_TOKEN);
        assert_eq!(config.eval.embedding_model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.eval.generation_timeout_secs.is_none());
    }

    #[test]
    fn test_validate_fails_without_api_key() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut config = Config::with_llm("https://api.example.com", "key", "gpt-4o-mini");
        assert!(config.validate().is_ok());

        config.eval.price_per_token = -1.0;
        assert!(matches!(config.validate(), Err(EvalError::Config(_))));
    }

    #[test]
    fn test_with_llm() {
        let config = Config::with_llm("https://api.example.com", "test-key", "gpt-4");
        assert_eq!(config.llm.api_base, "https://api.example.com");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gpt-4");
    }

    #[test]
    fn test_yaml_sections_override_defaults() {
        let yaml = r#"
llm:
  api_key: secret
  model: gpt-4o
eval:
  price_per_token: 0.001
  generation_timeout_secs: 30
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.api_key, "secret");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_base, "https://api.openai.com");
        assert_eq!(config.eval.price_per_token, 0.001);
        assert_eq!(config.eval.generation_timeout_secs, Some(30));
        assert_eq!(config.eval.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let result = Config::from_yaml("llm: [not, a, map]");
        assert!(matches!(result, Err(EvalError::Config(_))));
    }
}
