//! Configuration loading, validation, and management for DocRelay.
//!
//! Loads configuration from `~/.docrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on any outbound provider timeout, in seconds.
pub const MAX_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Tokenizer vocabularies a model profile may name.
pub const KNOWN_TOKENIZERS: [&str; 2] = ["cl100k_base", "o200k_base"];

/// The root configuration structure.
///
/// Maps directly to `~/.docrelay/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Document store configuration
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Prompt assembly and budgeting
    #[serde(default)]
    pub relay: RelayConfig,

    /// Per-provider endpoints, models and operator credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Extra model profiles on top of the built-in table
    #[serde(default)]
    pub models: Vec<ModelConfig>,
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

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Accepted `Authorization: Bearer` tokens. Empty disables auth.
    #[serde(default)]
    pub bearer_tokens: Vec<String>,

    /// CORS origins. Empty allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".into()]
}
fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            bearer_tokens: Vec::new(),
            allowed_origins: default_allowed_origins(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("bearer_tokens", &format!("[{} REDACTED]", self.bearer_tokens.len()))
            .field("allowed_origins", &self.allowed_origins)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// SQLite URL or file path. `sqlite::memory:` keeps everything in RAM.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    AppConfig::config_dir()
        .join("documents.db")
        .display()
        .to_string()
}
fn default_max_connections() -> u32 {
    4
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Tokens held back from the context window for estimator slack.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: u32,

    /// Output-token ceiling when the caller sends none.
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Log a warning when the planned output is cut below the request.
    #[serde(default = "default_true")]
    pub warn_on_truncation: bool,
}

fn default_safety_margin() -> u32 {
    100
}
fn default_max_tokens() -> u32 {
    100
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            safety_margin: default_safety_margin(),
            default_max_tokens: default_max_tokens(),
            warn_on_truncation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderConfig::openai")]
    pub openai: ProviderConfig,

    #[serde(default = "ProviderConfig::claude")]
    pub claude: ProviderConfig,

    #[serde(default = "ProviderConfig::custom")]
    pub custom: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai(),
            claude: ProviderConfig::claude(),
            custom: ProviderConfig::custom(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Operator-held credential for this provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub api_url: String,

    pub model: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Payload field carrying the prompt (completion-style providers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_field: Option<String>,

    /// Payload field carrying the output-token limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens_field: Option<String>,

    /// Dot-separated path to the answer in the response body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_field: Option<String>,
}

fn default_timeout_secs() -> u64 {
    MAX_PROVIDER_TIMEOUT_SECS
}

impl ProviderConfig {
    pub fn openai() -> Self {
        Self::with_endpoint("https://api.openai.com/v1", "gpt-3.5-turbo")
    }

    pub fn claude() -> Self {
        Self::with_endpoint("https://api.anthropic.com/v1/complete", "claude-2.1")
    }

    pub fn custom() -> Self {
        Self::with_endpoint("http://localhost:8000/process", "custom-model")
    }

    fn with_endpoint(api_url: &str, model: &str) -> Self {
        Self {
            api_key: None,
            api_url: api_url.into(),
            model: model.into(),
            timeout_secs: default_timeout_secs(),
            prompt_field: None,
            max_tokens_field: None,
            response_field: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("prompt_field", &self.prompt_field)
            .field("max_tokens_field", &self.max_tokens_field)
            .field("response_field", &self.response_field)
            .finish()
    }
}

/// An additional model profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: String,
    pub context_window: usize,
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
}

fn default_tokenizer() -> String {
    "cl100k_base".into()
}

impl AppConfig {
    /// Load configuration from the default path (~/.docrelay/config.toml).
    ///
    /// Environment variables override the file:
    /// - `OPENAI_API_KEY`, `CLAUDE_API_KEY`, `CUSTOM_API_KEY`
    /// - `DOCRELAY_DATABASE_URL`
    /// - `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides through `lookup`, then re-validate.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty("CLAUDE_API_KEY") {
            self.providers.claude.api_key = Some(key);
        }
        if let Some(key) = non_empty("CUSTOM_API_KEY") {
            self.providers.custom.api_key = Some(key);
        }
        if let Some(url) = non_empty("DOCRELAY_DATABASE_URL") {
            self.documents.database_url = url;
        }
        if let Some(port) = non_empty("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docrelay")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.default_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "relay.default_max_tokens must be > 0".into(),
            ));
        }

        if self.documents.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "documents.max_connections must be > 0".into(),
            ));
        }

        for (name, provider) in self.providers.iter() {
            if provider.timeout_secs == 0 || provider.timeout_secs > MAX_PROVIDER_TIMEOUT_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.timeout_secs must be between 1 and {MAX_PROVIDER_TIMEOUT_SECS}"
                )));
            }
            if provider.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.model must not be empty"
                )));
            }
            if provider.api_url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.api_url must not be empty"
                )));
            }
        }

        for model in &self.models {
            if model.id.trim().is_empty() {
                return Err(ConfigError::ValidationError("models[].id must not be empty".into()));
            }
            if model.context_window == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "models '{}': context_window must be > 0",
                    model.id
                )));
            }
            if !KNOWN_TOKENIZERS.contains(&model.tokenizer.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "models '{}': unknown tokenizer '{}' (expected one of {})",
                    model.id,
                    model.tokenizer,
                    KNOWN_TOKENIZERS.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl ProvidersConfig {
    /// Iterate `(selector, config)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ProviderConfig)> {
        [
            ("openai", &self.openai),
            ("claude", &self.claude),
            ("custom", &self.custom),
        ]
        .into_iter()
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
