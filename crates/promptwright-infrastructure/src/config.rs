//! Application configuration.
//!
//! Loaded from `config.toml` (see [`PromptwrightPaths::config_file`]). A
//! missing file, or any missing section or key, falls back to defaults:
//!
//! ```toml
//! [storage]
//! backend = "file"            # or "memory"
//! data_file = "/path/to/store.json"
//!
//! [logging]
//! level = "info"
//! directory = "/path/to/logs"
//! ```

use crate::paths::PromptwrightPaths;
use crate::storage::DatabaseOptions;
use promptwright_core::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which engine backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Store file; defaults to [`PromptwrightPaths::store_file`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Enables a daily rolling log file in this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default config file
    /// when `path` is `None`.
    ///
    /// # Errors
    ///
    /// - `StoreError::Io` if the file exists but can't be read
    /// - `StoreError::Serialization` if the file is not valid TOML
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match PromptwrightPaths::config_file() {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("No config location ({}), using defaults", e);
                    return Ok(Self::default());
                }
            },
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The engine options this configuration selects.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` when the file backend is selected with
    /// no `data_file` and no default data directory exists.
    pub fn database_options(&self) -> Result<DatabaseOptions> {
        match self.storage.backend {
            BackendKind::Memory => Ok(DatabaseOptions::memory()),
            BackendKind::File => {
                let path = match &self.storage.data_file {
                    Some(path) => path.clone(),
                    None => PromptwrightPaths::store_file()
                        .map_err(|e| StoreError::config(e.to_string()))?,
                };
                Ok(DatabaseOptions::file(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageBackend;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load(Some(&temp_dir.path().join("config.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.backend, BackendKind::File);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_file_backend_with_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let store_path = temp_dir.path().join("data").join("store.json");
        std::fs::write(
            &config_path,
            format!(
                "[storage]\nbackend = \"file\"\ndata_file = {:?}\n",
                store_path.display().to_string()
            ),
        )
        .unwrap();

        let config = AppConfig::load(Some(&config_path)).unwrap();
        assert_eq!(
            config.database_options().unwrap().backend,
            StorageBackend::File { path: store_path }
        );
    }

    #[test]
    fn test_memory_backend() {
        let config = AppConfig::parse("[storage]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.database_options().unwrap(), DatabaseOptions::memory());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = AppConfig::parse("[storage\nbackend = ").unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));

        let err = AppConfig::parse("[storage]\nbackend = \"sqlite\"\n").unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[test]
    fn test_full_file_parses() {
        let content = r#"
[storage]
backend = "memory"

[logging]
level = "warn"
directory = "/tmp/promptwright-logs"
"#;
        let expected = AppConfig {
            storage: StorageConfig {
                backend: BackendKind::Memory,
                data_file: None,
            },
            logging: LoggingConfig {
                level: Some("warn".to_string()),
                directory: Some(PathBuf::from("/tmp/promptwright-logs")),
            },
        };
        assert_eq!(AppConfig::parse(content).unwrap(), expected);
    }
}
