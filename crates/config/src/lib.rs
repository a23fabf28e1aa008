//! Configuration loading, validation, and management for the SMS Agent Stack.
//!
//! Loads configuration from `~/.smsagent/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use smsagent_core::ModelTier;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.smsagent/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Tier → provider model identifier table
    #[serde(default)]
    pub models: ModelTable,

    /// Document store and retrieval settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Twilio SMS channel
    #[serde(default)]
    pub sms: SmsConfig,

    /// Slack channel
    #[serde(default)]
    pub slack: SlackConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display name used in logs and status output
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Paths appended to `base_url`, tried in order
    #[serde(default = "default_endpoint_paths")]
    pub endpoint_paths: Vec<String>,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub presence_penalty: f32,

    #[serde(default)]
    pub frequency_penalty: f32,

    /// Replace the built-in system instruction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_provider_name() -> String {
    "hypermode".into()
}
fn default_base_url() -> String {
    "https://models.hypermode.host".into()
}
fn default_endpoint_paths() -> Vec<String> {
    vec!["/chat/completions".into(), "/api/v1/chat/completions".into()]
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_tokens() -> u32 {
    150
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_key: None,
            base_url: default_base_url(),
            endpoint_paths: default_endpoint_paths(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            system_prompt: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("endpoint_paths", &self.endpoint_paths)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("presence_penalty", &self.presence_penalty)
            .field("frequency_penalty", &self.frequency_penalty)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl ProviderConfig {
    /// Full endpoint URLs in attempt order.
    pub fn endpoints(&self) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        self.endpoint_paths
            .iter()
            .map(|p| format!("{base}/{}", p.trim_start_matches('/')))
            .collect()
    }
}

/// Fixed tier → model identifier mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTable {
    #[serde(default = "default_fast_model")]
    pub fast: String,
    #[serde(default = "default_balanced_model")]
    pub balanced: String,
    #[serde(default = "default_premium_model")]
    pub premium: String,
    #[serde(default = "default_smart_model")]
    pub smart: String,
}

fn default_fast_model() -> String {
    "meta-llama/Llama-3.2-3B-Instruct".into()
}
fn default_balanced_model() -> String {
    "gpt-4o-mini".into()
}
fn default_premium_model() -> String {
    "gpt-4o".into()
}
fn default_smart_model() -> String {
    "o3-mini".into()
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            balanced: default_balanced_model(),
            premium: default_premium_model(),
            smart: default_smart_model(),
        }
    }
}

impl ModelTable {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Balanced => &self.balanced,
            ModelTier::Premium => &self.premium,
            ModelTier::Smart => &self.smart,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned (non-recursively) for documents
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,

    /// File extensions to load, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Documents retrieved per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Documents joined into the prompt context
    #[serde(default = "default_context_documents")]
    pub context_documents: usize,

    /// Hard character cap on the joined context
    #[serde(default = "default_context_max_chars")]
    pub context_max_chars: usize,
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_extensions() -> Vec<String> {
    vec!["txt".into(), "md".into()]
}
fn default_max_results() -> usize {
    3
}
fn default_context_documents() -> usize {
    2
}
fn default_context_max_chars() -> usize {
    1000
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            documents_dir: default_documents_dir(),
            extensions: default_extensions(),
            max_results: default_max_results(),
            context_documents: default_context_documents(),
            context_max_chars: default_context_max_chars(),
        }
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
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_sid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// The Twilio number replies are sent from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default = "default_twilio_api_base")]
    pub api_base: String,
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".into()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            api_base: default_twilio_api_base(),
        }
    }
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &redact(&self.auth_token))
            .field("phone_number", &self.phone_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SmsConfig {
    pub fn is_complete(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.phone_number.is_some()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (xoxb-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Signing secret used to verify Events API requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".into()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            signing_secret: None,
            api_base: default_slack_api_base(),
        }
    }
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("signing_secret", &redact(&self.signing_secret))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.smsagent/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides. Set variables win over the file.
    ///
    /// The lookup is injected so tests never touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("HYPERMODE_API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get("HYPERMODE_BASE_URL") {
            self.provider.base_url = url;
        }
        if let Some(sid) = get("TWILIO_ACCOUNT_SID") {
            self.sms.account_sid = Some(sid);
        }
        if let Some(token) = get("TWILIO_AUTH_TOKEN") {
            self.sms.auth_token = Some(token);
        }
        if let Some(number) = get("TWILIO_PHONE_NUMBER") {
            self.sms.phone_number = Some(number);
        }
        if let Some(token) = get("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Some(secret) = get("SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret);
        }
        if let Some(dir) = get("SMSAGENT_DOCUMENTS_DIR") {
            self.knowledge.documents_dir = PathBuf::from(dir);
        }
        if let Some(port) = get("SMSAGENT_PORT") {
            match port.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SMSAGENT_PORT"),
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".smsagent")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.endpoint_paths.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.endpoint_paths must list at least one path".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be > 0".into(),
            ));
        }

        if self.knowledge.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "knowledge.extensions must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if a provider API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
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
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider.name, "hypermode");
        assert_eq!(config.provider.timeout_secs, 30);
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.knowledge.max_results, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_endpoints_in_order() {
        let provider = ProviderConfig {
            base_url: "https://models.example.com/".into(),
            ..ProviderConfig::default()
        };
        assert_eq!(
            provider.endpoints(),
            vec![
                "https://models.example.com/chat/completions".to_string(),
                "https://models.example.com/api/v1/chat/completions".to_string(),
            ]
        );
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.base_url, config.provider.base_url);
        assert_eq!(parsed.models.premium, config.models.premium);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_endpoint_list_rejected() {
        let mut config = AppConfig::default();
        config.provider.endpoint_paths.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert!(!result.unwrap().has_api_key());
    }

    #[test]
    fn blank_api_key_is_not_a_key() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("   ".into());
        assert!(!config.has_api_key());
        config.provider.api_key = Some("hm-key".into());
        assert!(config.has_api_key());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[provider]
base_url = "http://localhost:9999"

[models]
smart = "deepseek-r1"

[knowledge]
documents_dir = "/srv/docs"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.provider.base_url, "http://localhost:9999");
        assert_eq!(config.provider.endpoint_paths.len(), 2);
        assert_eq!(config.models.smart, "deepseek-r1");
        assert_eq!(config.models.fast, default_fast_model());
        assert_eq!(config.knowledge.documents_dir, PathBuf::from("/srv/docs"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nbase_url = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HYPERMODE_API_KEY", "hm-secret"),
            ("HYPERMODE_BASE_URL", "http://proxy.local"),
            ("TWILIO_ACCOUNT_SID", "AC123"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_PHONE_NUMBER", "+15550001111"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("SMSAGENT_PORT", "9090"),
            ("SLACK_SIGNING_SECRET", ""),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("hm-secret"));
        assert_eq!(config.provider.base_url, "http://proxy.local");
        assert!(config.sms.is_complete());
        assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-1"));
        // Blank values are treated as unset
        assert!(config.slack.signing_secret.is_none());
        assert_eq!(config.gateway.port, 9090);
    }

    #[test]
    fn invalid_port_env_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|k| (k == "SMSAGENT_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("hm-very-secret".into());
        config.sms.auth_token = Some("twilio-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("hm-very-secret"));
        assert!(!debug.contains("twilio-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn model_table_lookup() {
        let table = ModelTable::default();
        assert_eq!(table.model_for(ModelTier::Premium), "gpt-4o");
        assert_eq!(table.model_for(ModelTier::Smart), "o3-mini");
    }
}
