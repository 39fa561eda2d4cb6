//! Configuration for sitewatch.
//!
//! Configuration is read once at startup from a TOML file (default:
//! `~/.config/sitewatch/config.toml`) and passed into every component's
//! constructor. Secrets can be supplied through the environment instead
//! of the file: `TELEGRAM_BOT_TOKEN`, `DATABASE_URL` and `SMTP_PASS`
//! override their file counterparts. The watched sites live in a
//! separate `sites.toml` so they can be edited without touching the
//! service settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::app::{Result, SitewatchError};
use crate::domain::Site;

/// Main configuration struct. Immutable after load.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub scan: ScanConfig,
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
    pub smtp: Option<SmtpConfig>,
    /// Path to the sites file (ordered `[[sites]]` entries).
    pub sites_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token. Usually supplied via `TELEGRAM_BOT_TOKEN`.
    pub token: String,
    /// Optional chat to pre-register and subscribe to every site at
    /// startup, so the operator gets notifications without `/start`.
    pub admin_chat_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Seconds to sleep between sweeps in continuous mode.
    pub interval_secs: u64,
    /// Delay between items within one site, to go easy on the target.
    pub item_delay_ms: u64,
    /// Maximum body length kept from a detail page.
    pub body_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            item_delay_ms: 1200,
            body_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Settle time after navigation when rendering with the browser.
    pub render_settle_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "sitewatch/0.1 (+https://github.com/sitewatch)".to_string(),
            timeout_secs: 25,
            render_settle_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selected explicitly; there is no dialect probing.
    pub backend: StorageBackend,
    /// SQLite database path. Defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Postgres DSN, required for the `postgres` backend. Usually
    /// supplied via `DATABASE_URL`.
    pub database_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            db_path: None,
            database_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    /// Extra recipients added to every item's email fanout.
    pub global_recipients: Vec<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            global_recipients: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location when
    /// `None`. A missing file yields the defaults; a present but invalid
    /// file is an error. Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content).map_err(|e| {
                SitewatchError::Config(format!("failed to parse {}: {}", path.display(), e))
            })?
        } else {
            Self::default()
        };

        if config.sites_file.as_os_str().is_empty() {
            config.sites_file = PathBuf::from("sites.toml");
        }

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            let token = token.trim().to_string();
            if !token.is_empty() {
                self.telegram.token = token;
            }
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            let url = url.trim().to_string();
            if !url.is_empty() {
                self.storage.database_url = Some(url);
            }
        }
        if let Ok(pass) = std::env::var("SMTP_PASS") {
            if let Some(smtp) = self.smtp.as_mut() {
                smtp.password = pass;
            }
        }
    }

    /// The bot credential is the one thing the service cannot start
    /// without.
    pub fn require_bot_token(&self) -> Result<&str> {
        let token = self.telegram.token.trim();
        if token.is_empty() {
            return Err(SitewatchError::Config(
                "no Telegram bot token configured (set TELEGRAM_BOT_TOKEN)".to_string(),
            ));
        }
        Ok(token)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SitewatchError::Config("could not determine config directory".into()))?;
        Ok(config_dir.join("sitewatch").join("config.toml"))
    }

    pub fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SitewatchError::Config("could not determine data directory".into()))?;
        let dir = data_dir.join("sitewatch");
        fs::create_dir_all(&dir)?;
        Ok(dir.join("sitewatch.db"))
    }
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    #[serde(default)]
    sites: Vec<Site>,
}

/// Load the ordered site list from a TOML file of `[[sites]]` entries.
pub fn load_sites(path: &Path) -> Result<Vec<Site>> {
    let content = fs::read_to_string(path).map_err(|e| {
        SitewatchError::Config(format!("failed to read sites file {}: {}", path.display(), e))
    })?;
    let parsed: SitesFile = toml::from_str(&content).map_err(|e| {
        SitewatchError::Config(format!("failed to parse {}: {}", path.display(), e))
    })?;
    Ok(parsed.sites)
}
