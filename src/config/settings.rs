//! User settings for chronicle
//!
//! Manages the defaults applied when the caller leaves something out: the
//! audit source tag, the actor recorded for system-initiated changes, and the
//! logging setup.

use serde::{Deserialize, Serialize};

use super::paths::ChroniclePaths;
use crate::error::ChronicleError;
use crate::models::ActorId;

/// Logging preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Filter directive (e.g. "info", "chronicle=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// User settings for chronicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Source tag written to audit records when the caller gives none
    #[serde(default = "default_source")]
    pub default_source: String,

    /// Actor recorded when no actor can be resolved
    #[serde(default)]
    pub system_actor: ActorId,

    /// Logging preferences
    #[serde(default)]
    pub logging: LogSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_source() -> String {
    "cli".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_source: default_source(),
            system_actor: ActorId::SYSTEM,
            logging: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &ChroniclePaths) -> Result<Self, ChronicleError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                ChronicleError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                ChronicleError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ChroniclePaths) -> Result<(), ChronicleError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            ChronicleError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            ChronicleError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.default_source, "cli");
        assert_eq!(settings.system_actor, ActorId::SYSTEM);
        assert_eq!(settings.logging.level, "warn");
        assert!(!settings.logging.json);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ChroniclePaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.default_source = "batch".to_string();
        settings.logging.json = true;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.default_source, "batch");
        assert!(loaded.logging.json);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let loaded: Settings = serde_json::from_str(r#"{"default_source": "otp"}"#).unwrap();
        assert_eq!(loaded.schema_version, 1);
        assert_eq!(loaded.default_source, "otp");
        assert_eq!(loaded.logging.level, "warn");
    }
}
