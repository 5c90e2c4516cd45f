// crates/gateflag-config/src/config.rs
// ============================================================================
// Module: Gateflag Configuration
// Description: Configuration loading and validation for Gateflag.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, std
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Missing or invalid configuration fails closed rather than
//! silently falling back to defaults that might surprise an operator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "gateflag.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "GATEFLAG_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bounded channel capacity for the channel instrumenter.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
/// Maximum bounded channel capacity accepted from configuration.
const MAX_CHANNEL_CAPACITY: usize = 1_048_576;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Top-level Gateflag configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateflagConfig {
    /// Which `Adapter` to construct, and its backend-specific settings.
    pub adapter: AdapterConfig,
    /// Which `Instrumenter` to construct, and its backend-specific settings.
    #[serde(default)]
    pub instrumenter: InstrumenterConfig,
}

impl GateflagConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, else the `GATEFLAG_CONFIG` environment variable,
    /// else `./gateflag.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path is invalid, the file can't be
    /// read, exceeds the size limit, isn't valid UTF-8, or fails to parse
    /// or validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_owned()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_owned()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates internal consistency beyond what serde's deserialization
    /// already enforces.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.adapter.validate()?;
        self.instrumenter.validate()
    }
}

/// Which `Adapter` an application should construct.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterConfig {
    /// An in-process `MemoryAdapter`; state does not survive a restart.
    Memory,
    /// A `SqliteAdapter` backed by the given file.
    Sqlite(SqliteAdapterConfig),
    /// An `HttpAdapter` against a remote Gateflag-compatible engine.
    Http(HttpAdapterConfig),
}

impl AdapterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Memory => Ok(()),
            Self::Sqlite(config) => config.validate(),
            Self::Http(config) => config.validate(),
        }
    }
}

/// Settings for a SQLite-backed adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteAdapterConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
}

impl SqliteAdapterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path(&self.path)
    }
}

/// Settings for an HTTP adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpAdapterConfig {
    /// Base URL of the remote Gateflag-compatible engine.
    pub base_url: String,
}

impl HttpAdapterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("adapter.base_url must be non-empty".to_owned()));
        }
        url::Url::parse(&self.base_url).map_err(|err| ConfigError::Invalid(format!("adapter.base_url: {err}")))?;
        Ok(())
    }
}

/// Which `Instrumenter` an application should construct. Defaults to
/// `Noop`, matching the core crate's own default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstrumenterConfig {
    /// Discards every event.
    #[default]
    Noop,
    /// Writes one JSON record per event to the given log file.
    Log {
        /// Path to the log file events are appended to.
        path: PathBuf,
    },
    /// Forwards events over a bounded channel of the given capacity.
    Channel {
        /// Bounded channel capacity.
        #[serde(default = "default_channel_capacity")]
        capacity: usize,
    },
}

const fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl InstrumenterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Noop => Ok(()),
            Self::Log { path } => validate_path(path),
            Self::Channel { capacity } => {
                if *capacity == 0 {
                    return Err(ConfigError::Invalid("instrumenter.capacity must be greater than zero".to_owned()));
                }
                if *capacity > MAX_CHANNEL_CAPACITY {
                    return Err(ConfigError::Invalid("instrumenter.capacity too large".to_owned()));
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised loading or validating a [`GateflagConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the explicit argument, the environment, or
/// the default filename, in that order.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_owned()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against the length limits every Gateflag path must
/// satisfy, whether it names the config file itself or a backend setting
/// inside it (a SQLite file, a log file).
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_owned()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("path component too long".to_owned()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_parses_memory_adapter_and_noop_instrumenter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(&path, "[adapter]\nkind = \"memory\"\n").expect("write");
        let config = GateflagConfig::load(Some(&path)).expect("load");
        assert!(matches!(config.adapter, AdapterConfig::Memory));
        assert!(matches!(config.instrumenter, InstrumenterConfig::Noop));
    }

    #[test]
    fn load_parses_sqlite_adapter_and_channel_instrumenter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(
            &path,
            "[adapter]\nkind = \"sqlite\"\npath = \"gateflag.db\"\n\n[instrumenter]\nkind = \"channel\"\ncapacity = 64\n",
        )
        .expect("write");
        let config = GateflagConfig::load(Some(&path)).expect("load");
        assert!(matches!(config.adapter, AdapterConfig::Sqlite(_)));
        assert!(matches!(config.instrumenter, InstrumenterConfig::Channel { capacity: 64 }));
    }

    #[test]
    fn load_rejects_path_too_long() {
        let long_component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let path = PathBuf::from(format!("/tmp/{long_component}/gateflag.toml"));
        let err = GateflagConfig::load(Some(&path)).expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_rejects_oversized_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        let mut file = fs::File::create(&path).expect("create");
        let filler = vec![b' '; MAX_CONFIG_FILE_SIZE + 1];
        file.write_all(&filler).expect("write");
        let err = GateflagConfig::load(Some(&path)).expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_rejects_non_utf8_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x01]).expect("write");
        let err = GateflagConfig::load(Some(&path)).expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn load_rejects_invalid_http_base_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(&path, "[adapter]\nkind = \"http\"\nbase_url = \"not a url\"\n").expect("write");
        let err = GateflagConfig::load(Some(&path)).expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn channel_capacity_defaults_when_omitted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(&path, "[adapter]\nkind = \"memory\"\n\n[instrumenter]\nkind = \"channel\"\n").expect("write");
        let config = GateflagConfig::load(Some(&path)).expect("load");
        assert!(matches!(config.instrumenter, InstrumenterConfig::Channel { capacity } if capacity == DEFAULT_CHANNEL_CAPACITY));
    }

    #[test]
    fn channel_capacity_zero_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gateflag.toml");
        fs::write(&path, "[adapter]\nkind = \"memory\"\n\n[instrumenter]\nkind = \"channel\"\ncapacity = 0\n")
            .expect("write");
        let err = GateflagConfig::load(Some(&path)).expect_err("should reject");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
