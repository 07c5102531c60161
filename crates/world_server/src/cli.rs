//! Command-line interface handling for the world server.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
///
/// Every option except `--config` overrides a value of the configuration
/// file.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the world table directory
    pub world_db: Option<PathBuf>,
    /// Optional override for the character table directory
    pub character_db: Option<PathBuf>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Load and validate content, then exit
    pub validate_only: bool,
}

impl CliArgs {
    /// Parses command line arguments using clap.
    pub fn parse() -> Self {
        let matches = Command::new("World Server")
            .version(env!("CARGO_PKG_VERSION"))
            .about("World server content core: registries, spawns, respawn times and GUIDs")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("worldserver.toml"),
            )
            .arg(
                Arg::new("world-db")
                    .long("world-db")
                    .value_name("DIR")
                    .help("Directory of world table files"),
            )
            .arg(
                Arg::new("character-db")
                    .long("character-db")
                    .value_name("DIR")
                    .help("Directory of character table files"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("validate-only")
                    .long("validate-only")
                    .help("Load and validate all content, then exit")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("worldserver.toml")),
            world_db: matches.get_one::<String>("world-db").map(PathBuf::from),
            character_db: matches.get_one::<String>("character-db").map(PathBuf::from),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            validate_only: matches.get_flag("validate-only"),
        }
    }
}
