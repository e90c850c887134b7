//! Configuration and settings management for ToolpathKit
//!
//! Provides configuration file handling, defaults, and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Paths (where the backend writes generated tool path files)
//! - Logging (level and output format)
//! - Generation (job event distribution)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toolpathkit_core::EventBusConfig;

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};

const APP_DIR: &str = "toolpathkit";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory generated tool path files are resolved against
    pub data_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .map(|d| d.join(APP_DIR).join("data"))
                .unwrap_or_else(|| PathBuf::from("data")),
        }
    }
}

/// Logging preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Job event distribution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Broadcast channel capacity of the job event bus
    pub event_channel_capacity: usize,
    /// Keep a history of published job events
    #[serde(default)]
    pub event_history: bool,
    /// Maximum number of events retained in history
    pub max_event_history: usize,
    /// Seconds an event stays in history
    pub event_history_retention_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
            event_history: false,
            max_event_history: 1000,
            event_history_retention_secs: 300,
        }
    }
}

impl GenerationSettings {
    /// Event bus configuration derived from these settings
    pub fn event_bus_config(&self) -> EventBusConfig {
        EventBusConfig {
            channel_capacity: self.event_channel_capacity,
            enable_history: self.event_history,
            max_history_size: self.max_event_history,
            history_retention: Duration::from_secs(self.event_history_retention_secs),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathSettings,
    /// Logging preferences
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Job event distribution
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the config file: `<config dir>/toolpathkit/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join("config.toml"))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or fall back to defaults if it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No settings at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.paths.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "paths.data_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidSetting {
                key: "logging.level".to_string(),
                reason: format!("unknown level '{}'", self.logging.level),
            });
        }

        if self.generation.event_channel_capacity == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "generation.event_channel_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.generation.event_history && self.generation.max_event_history == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "generation.max_event_history".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert!(config.paths.data_dir.ends_with("data"));
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = Config::new();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { .. })
        ));

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::new();
        config.generation.event_channel_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_event_bus_config() {
        let settings = GenerationSettings {
            event_channel_capacity: 16,
            event_history: true,
            max_event_history: 8,
            event_history_retention_secs: 2,
        };
        let bus = settings.event_bus_config();
        assert_eq!(bus.channel_capacity, 16);
        assert!(bus.enable_history);
        assert_eq!(bus.max_history_size, 8);
        assert_eq!(bus.history_retention, Duration::from_secs(2));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Config::new().save_to_file(Path::new("settings.yaml"));
        assert!(matches!(
            result,
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }
}
