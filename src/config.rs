//! Configuration module for the visibility watch engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `INVIEW_` and use double
//! underscores to separate nested levels:
//! - `INVIEW_REGISTRY__MAX_SIGNAL_BATCH=64` sets `registry.max_signal_batch`
//! - `INVIEW_LOGGING__DEFAULT=debug` sets `logging.default`
//! - `INVIEW_DEBUG=true` sets `debug`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::hints::UrgencyMap;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Registry configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Priority-hint configuration
    #[serde(default)]
    pub hints: HintsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    /// Maximum number of signals drained per `process_signals` call.
    ///
    /// Bounds how long one cooperative pass may run; 0 means no limit.
    #[serde(default = "default_max_signal_batch")]
    pub max_signal_batch: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct HintsConfig {
    /// Connection classification -> urgency table for priority-adaptive
    /// policies.
    #[serde(default)]
    pub mapping: UrgencyMap,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level filter: error, warn, info, debug or trace.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_false() -> bool {
    false
}
fn default_max_signal_batch() -> usize {
    0
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            registry: RegistryConfig::default(),
            hints: HintsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_signal_batch: default_max_signal_batch(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for a .inview directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".inview/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with INVIEW_ prefix
            // Use double underscore (__) to separate nested levels
            // Single underscore (_) remains as is within field names
            .merge(Env::prefixed("INVIEW_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".") // Double underscore becomes dot
                    .into()
            }))
            // Extract into Settings struct
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for a .inview directory,
    /// searching from the current directory up to the root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".inview");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }

    /// Get the workspace root directory (where .inview is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".inview");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(ancestor.to_path_buf());
            }
        }

        None
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("INVIEW_").map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(".inview/settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use force to overwrite".into());
        }

        let settings = Settings::default();
        settings.save(&config_path)?;

        if force {
            println!("Overwrote configuration at: {}", config_path.display());
        } else {
            println!("Created default configuration at: {}", config_path.display());
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::{EffectiveConnection, Urgency};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(!settings.debug);
        assert_eq!(settings.registry.max_signal_batch, 0);
        assert_eq!(settings.logging.default, "warn");
        // The default urgency table covers the known connection classes
        assert_eq!(
            settings.hints.mapping.urgency_for(EffectiveConnection::Type4g),
            Some(Urgency::LoadNow)
        );
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2
debug = true

[registry]
max_signal_batch = 16

[logging]
default = "info"

[logging.modules]
registry = "debug"

[hints.mapping]
"4g" = "load-now"
"3g" = "defer-load"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert!(settings.debug);
        assert_eq!(settings.registry.max_signal_batch, 16);
        assert_eq!(settings.logging.default, "info");
        assert_eq!(settings.logging.modules["registry"], "debug");
        // Custom mapping replaces the default table
        assert_eq!(
            settings.hints.mapping.urgency_for(EffectiveConnection::Type3g),
            Some(Urgency::DeferLoad)
        );
        assert!(
            settings
                .hints
                .mapping
                .urgency_for(EffectiveConnection::Slow2g)
                .is_none()
        );
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.registry.max_signal_batch = 8;
        settings.logging.default = "debug".to_string();

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.registry.max_signal_batch, 8);
        assert_eq!(loaded.logging.default, "debug");
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        // Only specify a few settings
        let toml_content = r#"
[registry]
max_signal_batch = 4
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();

        // Modified values
        assert_eq!(settings.registry.max_signal_batch, 4);

        // Default values should still be present
        assert_eq!(settings.version, 1);
        assert_eq!(settings.logging.default, "warn");
        assert!(!settings.hints.mapping.is_empty());
    }
}
