//! # World Server - Main Entry Point
//!
//! Loads a world's static content, validates its cross references, recovers
//! respawn times and keeps the result available until shutdown. This entry
//! point handles CLI parsing, configuration loading, and application
//! lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! worldserver
//!
//! # Specify custom configuration
//! worldserver --config realm.toml
//!
//! # Override table directories and log level
//! worldserver --world-db /srv/world --character-db /srv/characters --log-level debug
//!
//! # Check content and exit
//! worldserver --validate-only
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `worldserver.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! - SIGINT (Ctrl+C) and SIGTERM shut the server down
//! - SIGHUP reloads all content, keeping the previous content if the reload fails (Unix systems)

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the world server.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, content reload or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

pub use config::{DatabaseSettings, LoggingSettings, ServerSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_world(dir: &Path) -> (PathBuf, PathBuf) {
        let world = dir.join("world");
        let characters = dir.join("characters");
        std::fs::create_dir_all(&world).unwrap();
        std::fs::write(
            world.join("player_levelstats.json"),
            "[[1, 1, 1, 23, 20, 22, 20, 20]]",
        )
        .unwrap();
        std::fs::write(
            world.join("map_template.json"),
            r#"[[0, "Eastern Kingdoms", 0, false]]"#,
        )
        .unwrap();
        (world, characters)
    }

    fn args_for(dir: &Path, world: PathBuf, characters: PathBuf) -> CliArgs {
        CliArgs {
            config_path: dir.join("worldserver.toml"),
            world_db: Some(world),
            character_db: Some(characters),
            log_level: Some("debug".to_string()),
            json_logs: false,
            validate_only: true,
        }
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs {
            config_path: PathBuf::from("test.toml"),
            world_db: Some(PathBuf::from("world")),
            character_db: None,
            log_level: Some("debug".to_string()),
            json_logs: true,
            validate_only: false,
        };

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.world_db, Some(PathBuf::from("world")));
        assert_eq!(args.character_db, None);
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
    }

    #[tokio::test]
    async fn test_application_validate_only() {
        let dir = TempDir::new().unwrap();
        let (world, characters) = write_world(dir.path());
        let args = args_for(dir.path(), world, characters);
        let config_path = args.config_path.clone();

        let app = Application::new(args).await.unwrap();
        assert!(config_path.exists());
        {
            let world = app.world();
            let world = world.read().await;
            assert!(world.validation_report().is_empty());
        }
        app.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_application_reload() {
        let dir = TempDir::new().unwrap();
        let (world, characters) = write_world(dir.path());
        std::fs::write(
            world.join("gameobject_template.json"),
            r#"[[1731, 3, 310, "Copper Vein", 0, 0, 1.0, 43, 0, 0, 0, 0, 0, 0, 0, ""]]"#,
        )
        .unwrap();
        let app = Application::new(args_for(dir.path(), world, characters))
            .await
            .unwrap();

        assert_eq!(app.reload().await.unwrap(), 0);
        let world = app.world();
        assert_eq!(world.read().await.summary().gameobject_templates, 1);
    }

    #[tokio::test]
    async fn test_application_rejects_missing_level_stats() {
        let dir = TempDir::new().unwrap();
        let (world, characters) = write_world(dir.path());
        std::fs::remove_file(world.join("player_levelstats.json")).unwrap();

        let result = Application::new(args_for(dir.path(), world, characters)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_application_rejects_invalid_override() {
        let dir = TempDir::new().unwrap();
        let (world, characters) = write_world(dir.path());
        let mut args = args_for(dir.path(), world, characters);
        args.log_level = Some("loud".to_string());

        assert!(Application::new(args).await.is_err());
    }
}
