//! Path management for chronicle
//!
//! Provides XDG-compliant path resolution for settings, the record store and
//! the audit log.
//!
//! ## Path Resolution Order
//!
//! 1. `CHRONICLE_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/chronicle` or `~/.config/chronicle`
//! 3. Windows: `%APPDATA%\chronicle`

use std::path::PathBuf;

use crate::error::ChronicleError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV_VAR: &str = "CHRONICLE_DATA_DIR";

/// Manages all paths used by chronicle
#[derive(Debug, Clone)]
pub struct ChroniclePaths {
    /// Base directory for all chronicle data
    base_dir: PathBuf,
}

impl ChroniclePaths {
    /// Create a new ChroniclePaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, ChronicleError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV_VAR) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create ChroniclePaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/chronicle/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (~/.config/chronicle/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the append-only audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to records.json (all committed rows)
    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), ChronicleError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| ChronicleError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| ChronicleError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if chronicle has been initialized (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, ChronicleError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").map_err(|_| {
                ChronicleError::Config("HOME environment variable not set".into())
            })?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("chronicle"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, ChronicleError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| ChronicleError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("chronicle"))
}
