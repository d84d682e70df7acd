mod defaults;
mod services;

#[cfg(test)]
mod tests;

pub use services::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SelinaError;
use defaults::*;

/// Top-level Selina configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub selina: SelinaConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub services: ServicesConfig,
}

/// General process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelinaConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SelinaConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl SelinaConfig {
    /// Directory holding the JSON collections (`users.json`, `bots.json`, ...).
    pub fn records_dir(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("data")
    }

    /// Directory holding one WhatsApp session store per bot.
    pub fn sessions_dir(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("sessions")
    }

    /// Directory for log files.
    pub fn logs_dir(&self) -> PathBuf {
        Path::new(&shellexpand(&self.data_dir)).join("logs")
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Externally reachable base URL used in setup links. Empty = `http://localhost:{port}`.
    #[serde(default)]
    pub public_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            public_url: String::new(),
        }
    }
}

impl ApiConfig {
    /// Link to the setup page for a bot.
    pub fn setup_url(&self, bot_id: &str) -> String {
        let base = if self.public_url.is_empty() {
            format!("http://localhost:{}", self.port)
        } else {
            self.public_url.trim_end_matches('/').to_string()
        };
        format!("{base}/setup/{bot_id}")
    }
}

/// Admin credentials.
///
/// `password_hash` is an Argon2 PHC string (`selina hash-password` prints one).
/// When either field is empty every admin request is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password_hash: String,
}

impl AdminConfig {
    pub fn is_configured(&self) -> bool {
        !self.email.is_empty() && !self.password_hash.is_empty()
    }
}

/// Per-user quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_bots_per_user")]
    pub max_bots_per_user: u32,
    #[serde(default = "default_bot_lifetime_days")]
    pub bot_lifetime_days: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_bots_per_user: default_max_bots_per_user(),
            bot_lifetime_days: default_bot_lifetime_days(),
        }
    }
}

/// Chat-facing bot behavior shared by every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Command prefix character(s).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Version string shown by `.alive` and `.owner`.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub owner_contact: String,
    #[serde(default)]
    pub owner_email: String,
    /// Avatar applied to every bot once it is ready. Empty = leave the avatar alone.
    #[serde(default = "default_profile_picture_url")]
    pub profile_picture_url: String,
    /// Newsletter JID used by the auto-join hook.
    #[serde(default)]
    pub channel_jid: String,
    /// Pause between broadcast sends.
    #[serde(default = "default_broadcast_delay_secs")]
    pub broadcast_delay_secs: u64,
    /// How long to wait for the transport to hand back a pairing code.
    #[serde(default = "default_pairing_timeout_secs")]
    pub pairing_timeout_secs: u64,
    /// Re-create sessions for bots persisted as active/authenticated on startup.
    #[serde(default)]
    pub resume_on_start: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            version: default_version(),
            owner_name: String::new(),
            owner_contact: String::new(),
            owner_email: String::new(),
            profile_picture_url: default_profile_picture_url(),
            channel_jid: String::new(),
            broadcast_delay_secs: default_broadcast_delay_secs(),
            pairing_timeout_secs: default_pairing_timeout_secs(),
            resume_on_start: false,
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Upper bound for `limits.bot_lifetime_days` (about 100 years).
pub const MAX_BOT_LIFETIME_DAYS: i64 = 36_500;

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, SelinaError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| SelinaError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| SelinaError::Config(format!("failed to parse config: {}", e)))?;

    if config.bot.prefix.is_empty() {
        return Err(SelinaError::Config("bot.prefix must not be empty".into()));
    }
    if !(1..=MAX_BOT_LIFETIME_DAYS).contains(&config.limits.bot_lifetime_days) {
        return Err(SelinaError::Config(format!(
            "limits.bot_lifetime_days must be between 1 and {MAX_BOT_LIFETIME_DAYS}"
        )));
    }

    Ok(config)
}
