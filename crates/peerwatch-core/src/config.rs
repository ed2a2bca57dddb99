//! Configuration resolution for `peerwatch`.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Config file (explicit path, else `~/.config/peerwatch/config.json`)
//! 3. Environment variables
//! 4. CLI arguments (applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete `peerwatch` configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Channel handle linked from the activation confirmation.
    pub channel_id: String,
    /// Admin handle linked from usage and expiry notices.
    pub admin_id: String,
    pub api_base_url: String,
    /// Long-poll timeout for `getUpdates`.
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel_id: String::new(),
            admin_id: String::new(),
            api_base_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 60,
        }
    }
}

/// Peer store location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Sweep timing and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub interval_secs: u64,
    pub usage_threshold_bytes: i64,
    pub expiry_threshold_ms: i64,
    /// Evaluate usage and expiry transitions independently instead of
    /// letting a usage transition pre-empt the expiry check.
    pub independent_checks: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            usage_threshold_bytes: 1_024_000_000,
            expiry_threshold_ms: 86_400_000,
            independent_checks: false,
        }
    }
}

impl Config {
    /// Reject configurations the bot cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::Config("telegram.bot_token is required".into()));
        }
        if self.notifier.interval_secs == 0 {
            return Err(Error::Config(
                "notifier.interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Database path, falling back to `~/.peerwatch/peers.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .path
            .clone()
            .or_else(|| dirs::home_dir().map(|h| h.join(".peerwatch").join("peers.db")))
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicit `path` must exist; the global path is only read when present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => load_config_file(p)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("peerwatch").join("config.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("PEERWATCH_BOT_TOKEN") {
        config.telegram.bot_token = val;
    }
    if let Some(val) = var("PEERWATCH_CHANNEL_ID") {
        config.telegram.channel_id = val;
    }
    if let Some(val) = var("PEERWATCH_ADMIN_ID") {
        config.telegram.admin_id = val;
    }
    if let Some(val) = var("PEERWATCH_DB_PATH") {
        config.database.path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("PEERWATCH_INTERVAL_SECS") {
        if let Ok(n) = val.parse() {
            config.notifier.interval_secs = n;
        }
    }
}
