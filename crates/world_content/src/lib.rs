//! # World Content - Static Content and Identity Core
//!
//! Loads the static content of a world server from a row store, keeps it in
//! keyed registries, and hands out the runtime identifiers new objects need.
//!
//! ## What lives here
//!
//! * **Content registries** - one [`ContentRegistry`] per template table,
//!   filled in the declared [`LOAD_ORDER`] and reloadable as a whole
//! * **Cross-reference validation** - dangling references between tables are
//!   repaired or rejected after loading (see [`validation`])
//! * **Spatial index** - every spawn bucketed per map, spawn mode and grid
//!   cell for map-side activation
//! * **Respawn clocks** - persisted respawn deadlines for creatures and game
//!   objects, safe for concurrent map threads
//! * **GUID allocator** - per-class identifier counters, with separate
//!   persistent and temporary ranges for creatures and game objects
//! * **Locale overlays** - translated text merged in at lookup time
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use world_content::{
//!     row, ContentSettings, GuidSettings, IdentifierClass, MemoryDatabase, World,
//! };
//!
//! let world_db = Arc::new(MemoryDatabase::new());
//! world_db.insert_rows("player_levelstats", vec![row![1, 1, 1, 23, 20, 22, 20, 20]]);
//! let character_db = Arc::new(MemoryDatabase::new());
//!
//! let world = World::open(
//!     world_db,
//!     character_db,
//!     &ContentSettings::default(),
//!     &GuidSettings::default(),
//! )?;
//! let guid = world.generate_low_guid(IdentifierClass::Item, false)?;
//! assert_eq!(guid, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Thread Safety
//!
//! Registries are written by a single loader and only read afterwards;
//! reloading takes `&mut World`. The allocator, respawn clocks and spatial
//! index take `&self` and synchronise internally.

pub use allocator::{IdentifierClass, ObjectGuidAllocator};
pub use config::{ContentSettings, GuidSettings};
pub use content::ContentStore;
pub use error::{ContentError, GuidError, RowError, SpawnError, StorageError};
pub use guid::{HighGuid, LowGuid, ObjectGuid};
pub use load_order::{LoadStage, LOAD_ORDER};
pub use locale::{Locale, LocaleTable};
pub use registry::{ContentRecord, ContentRegistry, LoadContext};
pub use respawn::RespawnClock;
pub use spatial::{SpatialIndex, SpawnPosition};
pub use storage::{Database, Field, MemoryDatabase, ResultSet, Row, Statement};
pub use validation::{ValidationReport, Violation};
pub use world::{World, WorldSummary};

pub mod allocator;
pub mod config;
pub mod content;
pub mod error;
pub mod guid;
pub mod load_order;
pub mod locale;
pub mod localization;
pub mod registry;
pub mod respawn;
pub mod script_names;
pub mod spatial;
pub mod spawns;
pub mod storage;
pub mod templates;
pub mod validation;
pub mod world;

#[cfg(test)]
mod tests;
