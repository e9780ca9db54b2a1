//! Configuration management
//!
//! Manages storage location, oracle settings, escalation behaviour and the
//! HTTP listener. Stored as TOML in the platform config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::knowledge::MatchMode;
use crate::resolver::DEFAULT_INTERIM_MESSAGE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where knowledge and help requests are persisted
    #[serde(default)]
    pub storage: StorageConfig,
    /// External AI oracle
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Escalation and matching behaviour
    #[serde(default)]
    pub escalation: EscalationConfig,
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file (defaults to the data directory)
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("frontdesk.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Turn the AI oracle off to escalate every unknown question
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Hard limit on one oracle call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    /// How many of the most recent knowledge entries prime the oracle
    #[serde(default = "default_max_context_entries")]
    pub max_context_entries: usize,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> Option<u32> {
    Some(300)
}

fn default_max_context_entries() -> usize {
    50
}

fn default_system_prompt() -> String {
    "You are a polite salon front desk assistant. Answer briefly. \
     If you are not sure of the answer, reply with exactly 'unknown'."
        .to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_context_entries: default_max_context_entries(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// What the caller hears while a supervisor is consulted
    #[serde(default = "default_interim_message")]
    pub interim_message: String,
    /// `exact` (default) or `contains`
    #[serde(default)]
    pub match_mode: MatchMode,
    /// Incoming webhook notified on every escalation
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_interim_message() -> String {
    DEFAULT_INTERIM_MESSAGE.to_string()
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            interim_message: default_interim_message(),
            match_mode: MatchMode::default(),
            webhook_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, writing defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load from an explicit path, writing defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the given file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "frontdesk", "frontdesk")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [oracle]
            model = "gpt-4o"
            timeout_secs = 5

            [escalation]
            match_mode = "contains"
            "#,
        )
        .unwrap();

        assert_eq!(config.oracle.model, "gpt-4o");
        assert_eq!(config.oracle.timeout_secs, 5);
        assert_eq!(config.oracle.api_key_env, "OPENAI_API_KEY");
        assert!(config.oracle.enabled);
        assert_eq!(config.escalation.match_mode, MatchMode::Contains);
        assert_eq!(config.escalation.interim_message, DEFAULT_INTERIM_MESSAGE);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.escalation.match_mode, MatchMode::Exact);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.oracle.base_url, config.oracle.base_url);
    }

    #[test]
    fn test_default_toml_parses() {
        let parsed: Config = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(parsed.server.host, "127.0.0.1");
    }
}
