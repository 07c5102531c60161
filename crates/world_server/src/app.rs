//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that opens the world,
//! reports its state periodically, reloads content on request and shuts down
//! on termination signals.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{ServerSignal, SignalListener},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use world_content::{Database, IdentifierClass, MemoryDatabase, World};

/// Main application struct.
///
/// Owns the configuration and the loaded [`World`]. The world sits behind an
/// async `RwLock` so the monitoring task can read it while a reload holds the
/// write side.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// The loaded world
    world: Arc<RwLock<World>>,
    /// Exit after loading instead of waiting for signals
    validate_only: bool,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Open both stores and load the world
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(world_db) = args.world_db {
            config.database.world_path = world_db.to_string_lossy().to_string();
        }

        if let Some(character_db) = args.character_db {
            config.database.character_path = character_db.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner();

        let world = Self::open_world(&config).await?;
        info!("🌍 World loaded: {}", world.summary());

        Ok(Self {
            config,
            world: Arc::new(RwLock::new(world)),
            validate_only: args.validate_only,
        })
    }

    /// Opens both table directories and loads the world on a blocking thread.
    async fn open_world(config: &AppConfig) -> Result<World, Box<dyn std::error::Error>> {
        let world_db: Arc<dyn Database> =
            Arc::new(MemoryDatabase::open_dir(&config.database.world_path)?);
        let character_db: Arc<dyn Database> =
            Arc::new(MemoryDatabase::open_dir(&config.database.character_path)?);

        let content = config.content.clone();
        let guids = config.guids.clone();
        let world = tokio::task::spawn_blocking(move || {
            World::open(world_db, character_db, &content, &guids)
        })
        .await??;
        Ok(world)
    }

    /// Shared handle to the loaded world.
    pub fn world(&self) -> Arc<RwLock<World>> {
        Arc::clone(&self.world)
    }

    /// Reloads all content under the write lock. A failed reload leaves the
    /// previous generation in place.
    ///
    /// Returns the number of content violations found by the reload.
    pub async fn reload(&self) -> Result<usize, Box<dyn std::error::Error>> {
        let mut guard = Arc::clone(&self.world).write_owned().await;
        let violations =
            tokio::task::spawn_blocking(move || guard.reload_content().map(|report| report.len()))
                .await??;
        Ok(violations)
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// SIGHUP reloads content; a failed reload is logged and the server keeps
    /// serving the previous generation.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        if self.validate_only {
            let world = self.world.read().await;
            let violations = world.validation_report().len();
            if violations == 0 {
                info!("✅ Content validated without violations");
            } else {
                warn!("⚠️ Content validated with {} violations", violations);
            }
            return Ok(());
        }

        info!("🌟 Starting World Server");
        self.log_configuration_summary();

        let monitoring_handle = {
            let world = Arc::clone(&self.world);
            let period = self.config.server.stats_interval_secs;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(period));
                // The first tick completes immediately.
                interval.tick().await;

                loop {
                    interval.tick().await;
                    let world = world.read().await;
                    let summary = world.summary();
                    info!("📊 World Status - {}", summary);

                    let creatures = world.allocator().range(IdentifierClass::Unit);
                    if let Some(start) = creatures.temporary_start() {
                        info!("📊 Creature GUIDs - temporary range starts at {}", start);
                    }
                }
            })
        };

        info!("✅ World Server is now running!");
        info!(
            "🔍 Status reports every {} seconds",
            self.config.server.stats_interval_secs
        );
        info!("🔄 Send SIGHUP to reload content");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let mut signals = SignalListener::new()?;
        loop {
            match signals.recv().await? {
                ServerSignal::Reload => match self.reload().await {
                    Ok(violations) => {
                        info!("✅ Content reloaded ({} violations)", violations)
                    }
                    Err(e) => {
                        error!("❌ Content reload failed, previous content kept: {}", e)
                    }
                },
                ServerSignal::Shutdown => break,
            }
        }

        // merciless shutdown
        tokio::spawn(async move {
            let mut again = match SignalListener::new() {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Failed to set up merciless shutdown signal handler: {e}");
                    return;
                }
            };
            loop {
                match again.recv().await {
                    Ok(ServerSignal::Shutdown) => break,
                    Ok(ServerSignal::Reload) => continue,
                    Err(e) => {
                        error!("Failed to wait for shutdown signal: {e}");
                        return;
                    }
                }
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        monitoring_handle.abort();

        log_final_statistics(&self.world).await;

        info!("✅ World Server shutdown complete");
        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🗄️ World tables: {}", self.config.database.world_path);
        info!(
            "  🗄️ Character tables: {}",
            self.config.database.character_path
        );
        info!(
            "  🆔 GUID distribution: {} ({}% temporary)",
            if self.config.guids.new_distribution {
                "split"
            } else {
                "legacy"
            },
            self.config.guids.temporary_proportion
        );
        info!(
            "  📈 Max player level: {}",
            self.config.content.max_player_level
        );
    }
}

/// Logs final statistics during shutdown.
async fn log_final_statistics(world: &RwLock<World>) {
    let world = world.read().await;
    let summary = world.summary();
    info!("📊 Final Statistics:");
    info!("  - Creatures spawned: {}", summary.creatures);
    info!("  - Game objects spawned: {}", summary.gameobjects);
    info!(
        "  - Pending respawns: {} creatures, {} game objects",
        summary.creature_respawns, summary.gameobject_respawns
    );
}
