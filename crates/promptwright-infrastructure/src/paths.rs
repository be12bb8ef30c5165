//! Unified path management for promptwright files.
//!
//! Configuration, the store file and logs all resolve through
//! [`PromptwrightPaths`] so every entry point agrees on where data lives on
//! each platform (Linux, macOS, Windows).

use std::path::PathBuf;

const APP_DIR: &str = "promptwright";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for promptwright.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/promptwright/          # Config directory
/// └── config.toml                  # Application configuration
///
/// ~/.local/share/promptwright/     # Data directory
/// ├── store.json                   # Record store (file backend)
/// ├── store.lock                   # Held while a process has it open
/// └── logs/                        # Rolling log files
///     └── promptwright.log.YYYY-MM-DD
/// ```
pub struct PromptwrightPaths;

impl PromptwrightPaths {
    /// Returns the configuration directory (e.g., `~/.config/promptwright/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the data directory (e.g., `~/.local/share/promptwright/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default path of the store file.
    pub fn store_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store.json"))
    }

    /// Returns the default log directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_app_directory() {
        // CI sandboxes may have no home directory at all
        let (Ok(config), Ok(data)) = (PromptwrightPaths::config_dir(), PromptwrightPaths::data_dir())
        else {
            return;
        };

        assert!(config.ends_with(APP_DIR));
        assert!(data.ends_with(APP_DIR));
        assert_eq!(
            PromptwrightPaths::config_file().unwrap(),
            config.join("config.toml")
        );
        assert_eq!(
            PromptwrightPaths::store_file().unwrap(),
            data.join("store.json")
        );
        assert!(PromptwrightPaths::logs_dir().unwrap().starts_with(&data));
    }
}
