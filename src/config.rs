use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "newsroom.toml";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DB_PATH: &str = "newsroom.db";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShareConfig {
    /// URL to POST approved-article announcements to. None disables sharing.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Directory the rotated JSON log files are written to.
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_log_dir() -> String {
    DEFAULT_LOG_DIR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_LOG_DIR.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file is not an error;
    /// defaults apply and CLI flags may override individual values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
