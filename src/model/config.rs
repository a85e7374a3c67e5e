use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Settings for the `cardinal` command line.
///
/// Layers, lowest precedence first: built-in defaults, the base file
/// (`--config`, else `config.toml`, else `config/default.toml`),
/// `config/<env>.toml`, `config/local.toml`, then `CARDINAL_*` environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub connection_string: Option<String>,

    /// Skip detection and use this dialect.
    pub dialect: Option<String>,

    /// Seconds before an in-flight request is cancelled; 0 waits forever.
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Providers asked in order until one has an estimate.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// A layer over the base config: only the keys it sets are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverlay {
    pub database: Option<DatabaseOverlay>,
    pub statistics: Option<StatisticsOverlay>,
    pub logging: Option<LoggingOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseOverlay {
    pub connection_string: Option<String>,
    pub dialect: Option<String>,
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsOverlay {
    pub providers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingOverlay {
    pub level: Option<String>,
}

pub const ENV_CONNECTION: &str = "CARDINAL_CONN";
pub const ENV_DIALECT: &str = "CARDINAL_DIALECT";
pub const ENV_TIMEOUT: &str = "CARDINAL_TIMEOUT";

const BASE_PATHS: [&str; 2] = ["config.toml", "config/default.toml"];
const LOCAL_PATH: &str = "config/local.toml";

fn default_timeout() -> u32 {
    30
}
fn default_providers() -> Vec<String> {
    vec!["index-metadata".to_string(), "sql-count".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            dialect: None,
            timeout: default_timeout(),
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Resolve every layer. An explicit `config_path` must exist; the
    /// optional layers are skipped when absent.
    pub fn load(config_path: Option<&str>, environment: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => match BASE_PATHS.iter().find(|path| Path::new(path).exists()) {
                Some(path) => Self::load_from_file(path)?,
                None => Config::default(),
            },
        };

        let env_path = environment.map(|env| format!("config/{}.toml", env));
        for layer in env_path.iter().map(String::as_str).chain([LOCAL_PATH]) {
            if Path::new(layer).exists() {
                debug!("Applying config overrides from {}", layer);
                config = config.merge(Self::load_overlay(layer)?);
            }
        }

        config.apply_overrides(|key| env::var(key).ok())
    }

    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        debug!("Loading config from: {}", path);
        toml::from_str(&read(path)?).map_err(|e| ConfigError::Parse(path.to_string(), e.to_string()))
    }

    pub fn load_overlay(path: &str) -> Result<ConfigOverlay, ConfigError> {
        debug!("Loading config overlay from: {}", path);
        toml::from_str(&read(path)?).map_err(|e| ConfigError::Parse(path.to_string(), e.to_string()))
    }

    /// Apply `CARDINAL_*` variables as returned by `lookup`.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(conn) = lookup(ENV_CONNECTION) {
            self.database.connection_string = Some(conn);
        }
        if let Some(dialect) = lookup(ENV_DIALECT) {
            self.database.dialect = Some(dialect);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.database.timeout = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(ENV_TIMEOUT.to_string(), timeout))?;
        }
        Ok(self)
    }

    /// Apply the keys `overlay` sets; everything else keeps its value.
    pub fn merge(mut self, overlay: ConfigOverlay) -> Self {
        if let Some(database) = overlay.database {
            if database.connection_string.is_some() {
                self.database.connection_string = database.connection_string;
            }
            if database.dialect.is_some() {
                self.database.dialect = database.dialect;
            }
            if let Some(timeout) = database.timeout {
                self.database.timeout = timeout;
            }
        }
        if let Some(providers) = overlay.statistics.and_then(|s| s.providers) {
            self.statistics.providers = providers;
        }
        if let Some(level) = overlay.logging.and_then(|l| l.level) {
            self.logging.level = level;
        }
        self
    }

    pub fn generate_default_config(path: &str) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(&Config::default()).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, toml_content).map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))
    }
}

fn read(path: &str) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config file '{0}': {1}")]
    Parse(String, String),

    #[error("Failed to write config file '{0}': {1}")]
    FileWrite(String, String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Invalid value for {0}: '{1}'")]
    InvalidValue(String, String),
}
