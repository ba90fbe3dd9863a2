//! Configuration loading.
//!
//! Settings are loaded from TOML with the following resolution order:
//! 1. explicit path (CLI flag)
//! 2. `~/.straico/config.toml` (user)
//! 3. `/etc/straico/config.toml` (system)
//! 4. built-in defaults
//!
//! Environment variables (`API_BASE_URL`, `DEFAULT_CHAT_MODEL`,
//! `MAX_HISTORY_PER_CHANNEL`, `LOG_LEVEL`, `LOG_FILE`) override the file.
//!
//! The API key is loaded separately with mandatory permission checks:
//! 1. `~/.straico/secrets.toml` (user, must be 0600)
//! 2. `/etc/straico/secrets.toml` (system, must be 0600)
//! 3. `STRAICO_API_KEY`

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::conversation::{ConversationStore, DEFAULT_MAX_HISTORY};
use crate::gateway::{DEFAULT_BASE_URL, Straico, StraicoBuilder};
use crate::types::{DEFAULT_CHAT_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_VIDEO_MODEL};
use crate::{GatewayError, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "STRAICO_API_KEY";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base address (default: https://api.straico.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub default_chat_model: String,
    #[serde(default = "default_image_model")]
    pub default_image_model: String,
    #[serde(default = "default_video_model")]
    pub default_video_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_chat_model: default_chat_model(),
            default_image_model: default_image_model(),
            default_video_model: default_video_model(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_video_model() -> String {
    DEFAULT_VIDEO_MODEL.to_string()
}

/// Conversation history settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Turns kept per channel (default: 50).
    #[serde(default = "default_max_history")]
    pub max_history_per_channel: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_per_channel: default_max_history(),
        }
    }
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional file receiving a copy of the log output.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` means run on defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GatewayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".straico").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/straico/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(model) = lookup("DEFAULT_CHAT_MODEL") {
            self.api.default_chat_model = model;
        }
        if let Some(raw) = lookup("MAX_HISTORY_PER_CHANNEL") {
            self.conversation.max_history_per_channel = raw.trim().parse().map_err(|e| {
                GatewayError::Configuration(format!(
                    "Invalid numeric configuration MAX_HISTORY_PER_CHANNEL={raw:?}: {e}"
                ))
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.conversation.max_history_per_channel < 1 {
            return Err(GatewayError::Configuration(
                "max_history_per_channel must be positive".into(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(GatewayError::Configuration("base_url cannot be empty".into()));
        }
        Ok(())
    }

    /// A gateway builder carrying the configured base address and `api_key`.
    pub fn gateway_builder(&self, api_key: impl Into<String>) -> StraicoBuilder {
        Straico::builder()
            .api_key(api_key)
            .base_url(&self.api.base_url)
    }

    /// A conversation store sized from the configuration.
    pub fn conversation_store(&self) -> Result<ConversationStore> {
        ConversationStore::new(self.conversation.max_history_per_channel)
    }
}

/// Secrets configuration (API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".straico").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/straico/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(GatewayError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// The API key from the secrets file, falling back to `STRAICO_API_KEY`.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| lookup(API_KEY_ENV))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| GatewayError::Configuration(format!("{API_KEY_ENV} is required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.straico.com");
        assert_eq!(config.api.default_chat_model, "openai/gpt-5");
        assert_eq!(config.api.default_image_model, "openai/dall-e-3");
        assert_eq!(config.api.default_video_model, "runway-gen3");
        assert_eq!(config.conversation.max_history_per_channel, 50);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
            [api]
            base_url = "http://localhost:9000"

            [conversation]
            max_history_per_channel = 100
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9000");
        assert_eq!(config.conversation.max_history_per_channel, 100);
        // Defaults preserved
        assert_eq!(config.api.default_chat_model, "openai/gpt-5");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("API_BASE_URL", "http://proxy:1"),
                ("DEFAULT_CHAT_MODEL", "anthropic/claude"),
                ("MAX_HISTORY_PER_CHANNEL", " 20 "),
                ("LOG_LEVEL", "debug"),
                ("LOG_FILE", "/tmp/bot.log"),
            ]))
            .unwrap();
        assert_eq!(config.api.base_url, "http://proxy:1");
        assert_eq!(config.api.default_chat_model, "anthropic/claude");
        assert_eq!(config.conversation.max_history_per_channel, 20);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/bot.log")));
    }

    #[test]
    fn non_numeric_history_is_configuration_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("MAX_HISTORY_PER_CHANNEL", "lots")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn zero_history_fails_validation() {
        let mut config = Config::default();
        config.conversation.max_history_per_channel = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_from_secrets_then_env() {
        let secrets = Secrets {
            api_key: Some("from-file".into()),
        };
        assert_eq!(
            secrets.api_key_with(env(&[(API_KEY_ENV, "from-env")])).unwrap(),
            "from-file"
        );

        let secrets = Secrets::default();
        assert_eq!(
            secrets.api_key_with(env(&[(API_KEY_ENV, "from-env")])).unwrap(),
            "from-env"
        );
    }

    #[test]
    fn missing_api_key_is_configuration_error() {
        let err = Secrets::default().api_key_with(env(&[])).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = Secrets::default()
            .api_key_with(env(&[(API_KEY_ENV, "  ")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn parse_secrets() {
        let secrets: Secrets = toml::from_str(r#"api_key = "sk-test""#).unwrap();
        assert_eq!(secrets.api_key.as_deref(), Some("sk-test"));
    }
}
