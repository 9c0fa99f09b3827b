//! Layered configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`TICKETDESK_*`, `__` separates nested keys)
//! 2. `<config_dir>/ticketdesk/config.toml`
//! 3. Built-in defaults
//!
//! `TICKETDESK_API_URL` maps to `api_url`, `TICKETDESK_DATA_DIR` to
//! `data_dir` and `TICKETDESK_CHAT_API_KEY` to `chat_api_key`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::api::DEFAULT_API_URL;

pub const ENV_PREFIX: &str = "TICKETDESK_";
const DB_FILE: &str = "state.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine a data directory; set TICKETDESK_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL.
    pub api_url: String,
    /// Where local storage lives. Defaults to the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Chat assistant key. Carried for completeness; nothing here uses it.
    #[serde(default)]
    pub chat_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            chat_api_key: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Export `.env` from the current directory (or a parent) into the
    /// process environment. Must run before tracing is set up, since
    /// `TICKETDESK_LOG` may come from it. Variables already set win.
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    pub fn figment() -> Figment {
        Self::figment_from(Self::global_config_path())
    }

    /// Provider chain with an explicit config file, which may not exist.
    pub fn figment_from(config_file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = config_file {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let mut config: Config = figment.extract()?;
        config.validate()?;
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ticketdesk").join("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.api_url),
            });
        }
        Ok(())
    }

    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("ticketdesk")))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.data_dir()?.join(DB_FILE))
    }

    /// The chat key with all but the last four characters hidden.
    pub fn masked_chat_key(&self) -> Option<String> {
        self.chat_api_key.as_deref().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 4 {
                "*".repeat(chars.len())
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("{}{}", "*".repeat(chars.len() - 4), tail)
            }
        })
    }
}
