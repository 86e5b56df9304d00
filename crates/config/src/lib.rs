//! Configuration loading, validation, and management for Ironquill.
//!
//! Loads configuration from `~/.ironquill/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ironquill/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model endpoint provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature, in [0.0, 2.0]
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// The base system prompt for the conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Whether the conversation keeps history between turns
    #[serde(default = "default_true")]
    pub use_history: bool,

    /// Hard ceiling on tool rounds per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Summarization configuration
    #[serde(default)]
    pub summarize: SummarizeConfig,

    /// Tool-execution service configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Session persistence configuration
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_system_prompt() -> String {
    "You are a helpful assistant.".into()
}
fn default_max_tool_rounds() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("use_history", &self.use_history)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("summarize", &self.summarize)
            .field("tools", &self.tools)
            .field("persistence", &self.persistence)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// When and how history is condensed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Total-token count that triggers condensation (strictly greater
    /// than)
    #[serde(default = "default_summarize_threshold")]
    pub threshold: u32,

    /// Model for the summarization request; falls back to the default
    /// model when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_summarize_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_summarize_temperature")]
    pub temperature: f32,

    /// Override for the summarization system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Override for the trailing summarize instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

fn default_summarize_threshold() -> u32 {
    4000
}
fn default_summarize_max_tokens() -> u32 {
    1024
}
fn default_summarize_temperature() -> f32 {
    0.3
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_summarize_threshold(),
            model: None,
            max_tokens: default_summarize_max_tokens(),
            temperature: default_summarize_temperature(),
            prompt: None,
            instruction: None,
        }
    }
}

/// Where tool calls are executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// "local" (built-in tools), "http" (remote tool server), or "none"
    #[serde(default = "default_tools_mode")]
    pub mode: String,

    /// Base URL of the remote tool server (http mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub call_timeout_secs: u64,
}

fn default_tools_mode() -> String {
    "local".into()
}
fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mode: default_tools_mode(),
            http_url: None,
            call_timeout_secs: default_tool_timeout(),
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override for the session file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.ironquill/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `IRONQUILL_API_KEY` (highest priority)
    /// - `OPENROUTER_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("IRONQUILL_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("IRONQUILL_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("IRONQUILL_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ironquill")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.summarize.temperature) {
            return Err(ConfigError::ValidationError(
                "summarize.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_tool_rounds must be at least 1".into(),
            ));
        }

        match self.tools.mode.as_str() {
            "local" | "none" => {}
            "http" => {
                if self.tools.http_url.is_none() {
                    return Err(ConfigError::ValidationError(
                        "tools.http_url is required when tools.mode is \"http\"".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown tools.mode \"{other}\" (expected \"local\", \"http\" or \"none\")"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            use_history: true,
            max_tool_rounds: default_max_tool_rounds(),
            summarize: SummarizeConfig::default(),
            tools: ToolsConfig::default(),
            persistence: PersistenceConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_provider, "openrouter");
        assert!(config.use_history);
        assert_eq!(config.max_tool_rounds, 10);
        assert_eq!(config.summarize.threshold, 4000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.summarize.threshold, config.summarize.threshold);
        assert_eq!(parsed.tools.mode, config.tools.mode);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tool_rounds_rejected() {
        let config = AppConfig {
            max_tool_rounds: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn http_tools_mode_requires_url() {
        let mut config = AppConfig::default();
        config.tools.mode = "http".into();
        assert!(config.validate().is_err());

        config.tools.http_url = Some("http://localhost:8900".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_tools_mode_rejected() {
        let mut config = AppConfig::default();
        config.tools.mode = "carrier-pigeon".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().default_provider, "openrouter");
    }

    #[test]
    fn load_from_reads_and_validates_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "default_model = \"gpt-4o\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_model, "gpt-4o");

        std::fs::write(&path, "default_temperature = 9.0\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
default_model = "gpt-4o"

[summarize]
threshold = 9000

[tools]
mode = "none"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_model, "gpt-4o");
        assert_eq!(config.summarize.threshold, 9000);
        assert_eq!(config.summarize.max_tokens, 1024);
        assert_eq!(config.tools.mode, "none");
        assert!(config.use_history);
    }

    #[test]
    fn provider_overrides_parse() {
        let toml_str = r#"
[providers.openai]
api_key = "sk-test"
api_url = "https://api.openai.com/v1"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        let openai = &config.providers["openai"];
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn debug_redacts_api_keys() {
        let config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("openrouter"));
        assert!(toml_str.contains("max_tool_rounds"));
    }
}
