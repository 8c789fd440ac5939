//! TOML-based configuration for the metrics runtime.
//!
//! Supports a config file (metrics-runtime.toml) with environment variable
//! expansion in paths.
//!
//! Example configuration:
//! ```toml
//! [catalog]
//! path = "${HOME}/.metrics-runtime/catalog.db"
//!
//! [query]
//! default_limit = 100
//! timeseries_limit = 1000
//! time_column = "timestamp"
//! toplist_time_column = ""
//! priority = 1
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "METRICS_RUNTIME_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog store configuration.
    pub catalog: CatalogSettings,

    /// Query compilation and execution configuration.
    pub query: QuerySettings,
}

/// Catalog store configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// SQLite database path (supports ${ENV_VAR} expansion). In-memory when unset.
    pub path: Option<String>,
}

impl CatalogSettings {
    /// Get the database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Query compilation and execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Toplist limit when the request leaves it unset.
    pub default_limit: u64,

    /// Row cap for time series queries.
    pub timeseries_limit: u64,

    /// Time field for time series and totals.
    pub time_column: String,

    /// Time column for toplist bounds; empty disables them.
    pub toplist_time_column: String,

    /// Priority passed to the executor with every statement.
    pub priority: i32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_limit: 100,
            timeseries_limit: 1000,
            time_column: "timestamp".to_string(),
            toplist_time_column: String::new(),
            priority: 1,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `METRICS_RUNTIME_CONFIG`
    /// 2. `./metrics-runtime.toml`
    /// 3. `~/.config/metrics-runtime/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("metrics-runtime.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("metrics-runtime").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.query.time_column.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "query.time_column must not be empty".to_string(),
            ));
        }
        if self.query.default_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.default_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
