//! Content and identifier settings.
//!
//! These are plain serde structs so the server can embed them in its TOML
//! configuration file.

use serde::{Deserialize, Serialize};

/// Default share (percent) of the creature/game object GUID space given to
/// temporary spawns.
pub const DEFAULT_TEMPORARY_PROPORTION: u32 = 90;

/// Accepted range for [`GuidSettings::temporary_proportion`].
pub const TEMPORARY_PROPORTION_RANGE: std::ops::RangeInclusive<u32> = 50..=95;

fn default_new_distribution() -> bool {
    true
}

fn default_temporary_proportion() -> u32 {
    DEFAULT_TEMPORARY_PROPORTION
}

fn default_max_player_level() -> u8 {
    70
}

/// GUID distribution settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidSettings {
    /// Split creature and game object GUIDs into persistent and temporary ranges
    #[serde(default = "default_new_distribution")]
    pub new_distribution: bool,
    /// Percentage of the remaining range reserved for temporary spawns
    #[serde(default = "default_temporary_proportion")]
    pub temporary_proportion: u32,
}

impl Default for GuidSettings {
    fn default() -> Self {
        Self {
            new_distribution: default_new_distribution(),
            temporary_proportion: default_temporary_proportion(),
        }
    }
}

/// Settings that shape how content rows are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSettings {
    /// Highest player level with stats; rows above it are ignored
    #[serde(default = "default_max_player_level")]
    pub max_player_level: u8,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            max_player_level: default_max_player_level(),
        }
    }
}
