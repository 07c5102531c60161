//! Configuration management for the world server.
//!
//! This module handles loading and validation of server configuration from
//! TOML files. Content and GUID sections reuse the settings types of
//! `world_content` directly.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use world_content::{ContentSettings, GuidSettings};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_world_path() -> String {
    "data/world".to_string()
}

fn default_character_path() -> String {
    "data/characters".to_string()
}

fn default_stats_interval() -> u64 {
    60
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Table directories of the two stores
    #[serde(default)]
    pub database: DatabaseSettings,
    /// How content rows are interpreted
    #[serde(default)]
    pub content: ContentSettings,
    /// GUID range distribution
    #[serde(default)]
    pub guids: GuidSettings,
    /// Runtime settings of the process
    #[serde(default)]
    pub server: ServerSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Locations of the world (static content) and character (runtime state)
/// stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_world_path")]
    pub world_path: String,
    #[serde(default = "default_character_path")]
    pub character_path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            world_path: default_world_path(),
            character_path: default_character_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Seconds between world status reports
    #[serde(default = "default_stats_interval")]
    pub stats_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            stats_interval_secs: default_stats_interval(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.database.world_path.is_empty() {
            return Err("World database path cannot be empty".to_string());
        }
        if self.database.character_path.is_empty() {
            return Err("Character database path cannot be empty".to_string());
        }
        if self.database.world_path == self.database.character_path {
            return Err("World and character databases must be different directories".to_string());
        }

        if self.content.max_player_level == 0 {
            return Err("max_player_level must be at least 1".to_string());
        }

        if self.server.stats_interval_secs == 0 {
            return Err("stats_interval_secs must be greater than 0".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, LOG_LEVELS
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.guids.new_distribution);
        assert_eq!(config.guids.temporary_proportion, 90);
        assert_eq!(config.content.max_player_level, 70);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "debug".to_string();

        config.database.character_path = config.database.world_path.clone();
        assert!(config.validate().is_err());
        config.database.character_path = "data/characters".to_string();

        config.content.max_player_level = 0;
        assert!(config.validate().is_err());
        config.content.max_player_level = 70;

        // The allocator repairs an out-of-range proportion on its own.
        config.guids.temporary_proportion = 99;
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("worldserver.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.server.stats_interval_secs, 60);

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.database.world_path, config.database.world_path);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("worldserver.toml");
        tokio::fs::write(
            &path,
            "[guids]\ntemporary_proportion = 75\n\n[logging]\nlevel = \"warn\"\njson_format = true\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.guids.temporary_proportion, 75);
        assert!(config.guids.new_distribution);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json_format);
        assert_eq!(config.database.character_path, "data/characters");
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("worldserver.toml");
        tokio::fs::write(&path, "[guids\nnew_distribution = maybe")
            .await
            .unwrap();

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }
}
