//! Configuration loading, validation, and management for actionstage.
//!
//! Loads configuration from `~/.actionstage/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.actionstage/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the default provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model provider ("openai", "openrouter", "ollama", "gemini")
    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Extraction loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Capability adapter credentials and targets
    #[serde(default)]
    pub adapters: AdaptersConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}

/// Redact a secret for Debug output.
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
            .field("gateway", &self.gateway)
            .field("agent", &self.agent)
            .field("providers", &self.providers)
            .field("adapters", &self.adapters)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard ceiling on model round-trips per attention index
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// IANA zone stated in the prompt and used for event times
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_max_turns() -> usize {
    10
}
fn default_time_zone() -> String {
    "America/New_York".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            time_zone: default_time_zone(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
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

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdaptersConfig {
    #[serde(default)]
    pub google: GoogleConfig,

    #[serde(default)]
    pub jira: JiraConfig,

    #[serde(default)]
    pub slack: SlackConfig,
}

/// Google Calendar, Gmail and People share one OAuth access token.
#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,

    #[serde(default = "default_gmail_url")]
    pub gmail_url: String,

    #[serde(default = "default_people_url")]
    pub people_url: String,
}

fn default_calendar_id() -> String {
    "primary".into()
}
fn default_calendar_url() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}
fn default_gmail_url() -> String {
    "https://gmail.googleapis.com/gmail/v1".into()
}
fn default_people_url() -> String {
    "https://people.googleapis.com/v1".into()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            calendar_id: default_calendar_id(),
            calendar_url: default_calendar_url(),
            gmail_url: default_gmail_url(),
            people_url: default_people_url(),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &redact(&self.access_token))
            .field("calendar_id", &self.calendar_id)
            .field("calendar_url", &self.calendar_url)
            .field("gmail_url", &self.gmail_url)
            .field("people_url", &self.people_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    /// e.g. "https://example.atlassian.net"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_jira_project")]
    pub project: String,

    #[serde(default = "default_issue_type_id")]
    pub issue_type_id: String,
}

fn default_jira_project() -> String {
    "SCRUM".into()
}
fn default_issue_type_id() -> String {
    "10001".into()
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: None,
            user: None,
            api_token: None,
            project: default_jira_project(),
            issue_type_id: default_issue_type_id(),
        }
    }
}

impl JiraConfig {
    /// Server, user and token are all required to reach the tracker.
    pub fn is_complete(&self) -> bool {
        self.server.is_some() && self.user.is_some() && self.api_token.is_some()
    }
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("api_token", &redact(&self.api_token))
            .field("project", &self.project)
            .field("issue_type_id", &self.issue_type_id)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Default channel for outgoing messages
    #[serde(default = "default_slack_channel")]
    pub channel: String,

    #[serde(default = "default_slack_url")]
    pub api_url: String,
}

fn default_slack_channel() -> String {
    "#all-hackathon".into()
}
fn default_slack_url() -> String {
    "https://slack.com/api".into()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel: default_slack_channel(),
            api_url: default_slack_url(),
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("channel", &self.channel)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.actionstage/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
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

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    ///
    /// The model API key is taken from the first of `ACTIONSTAGE_API_KEY`,
    /// `OPENAI_API_KEY`, `GEMINI_API_KEY`, `API_KEY` when the file set none.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = ["ACTIONSTAGE_API_KEY", "OPENAI_API_KEY", "GEMINI_API_KEY", "API_KEY"]
                .iter()
                .find_map(|key| lookup(key).filter(|v| !v.is_empty()));
        }

        if let Some(provider) = lookup("ACTIONSTAGE_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("ACTIONSTAGE_MODEL") {
            self.default_model = model;
        }

        if let Some(token) = lookup("GOOGLE_ACCESS_TOKEN") {
            self.adapters.google.access_token = Some(token);
        }

        if let Some(token) = lookup("JIRA_API_TOKEN") {
            self.adapters.jira.api_token = Some(token);
        }

        if let Some(token) = lookup("SLACK_API_TOKEN") {
            self.adapters.slack.bot_token = Some(token);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".actionstage")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError("agent.max_turns must be at least 1".into()));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be non-zero".into()));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
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
            gateway: GatewayConfig::default(),
            agent: AgentConfig::default(),
            providers: HashMap::new(),
            adapters: AdaptersConfig::default(),
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
