//! ToolpathKit Settings Crate
//!
//! Handles application configuration: where generated tool path files
//! live, how logging is set up, and how job events are distributed.

pub mod config;
pub mod error;

pub use config::{Config, GenerationSettings, LoggingSettings, PathSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
