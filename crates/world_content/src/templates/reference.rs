//! Reference stores that other content points into.

use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;
use tracing::error;

/// Number of spell schools; higher values are clamped to physical.
pub const MAX_SPELL_SCHOOL: u8 = 7;

/// `spell_template (id, school, name)`
#[derive(Debug, Clone, PartialEq)]
pub struct SpellEntry {
    pub id: u32,
    pub school: u8,
    pub name: String,
}

impl ContentRecord for SpellEntry {
    type Key = u32;
    const TABLE: &'static str = "spell_template";
    const NAME: &'static str = "spells";

    fn key(&self) -> u32 {
        self.id
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let id = row.u32(0)?;
        if id == 0 {
            return Err(RowError::Invalid("spell id 0 is reserved".into()));
        }
        let mut school = row.u8(1)?;
        if school >= MAX_SPELL_SCHOOL {
            error!("Spell {} has invalid school {}, set to physical", id, school);
            school = 0;
        }
        Ok(Self {
            id,
            school,
            name: row.string(2)?,
        })
    }
}

/// `faction_template (id, faction, friendly_mask, hostile_mask)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionTemplateEntry {
    pub id: u32,
    pub faction: u32,
    pub friendly_mask: u32,
    pub hostile_mask: u32,
}

impl ContentRecord for FactionTemplateEntry {
    type Key = u32;
    const TABLE: &'static str = "faction_template";
    const NAME: &'static str = "faction templates";

    fn key(&self) -> u32 {
        self.id
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        Ok(Self {
            id: row.u32(0)?,
            faction: row.u32(1)?,
            friendly_mask: row.u32(2)?,
            hostile_mask: row.u32(3)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapType {
    Common,
    Instance,
    Raid,
    Battleground,
    Arena,
}

impl MapType {
    pub fn from_u8(value: u8) -> Option<MapType> {
        match value {
            0 => Some(MapType::Common),
            1 => Some(MapType::Instance),
            2 => Some(MapType::Raid),
            3 => Some(MapType::Battleground),
            4 => Some(MapType::Arena),
            _ => None,
        }
    }
}

/// Spawn-mask bit of the normal mode.
pub const SPAWNMASK_NORMAL: u8 = 0x01;
/// Spawn-mask bit of the heroic mode.
pub const SPAWNMASK_HEROIC: u8 = 0x02;

/// `map_template (id, name, map_type, supports_heroic)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub id: u32,
    pub name: String,
    pub map_type: MapType,
    pub supports_heroic: bool,
}

impl MapEntry {
    /// Spawn-mask bits a spawn on this map may carry.
    pub fn valid_spawn_mask(&self) -> u8 {
        if self.supports_heroic && self.is_dungeon() {
            SPAWNMASK_NORMAL | SPAWNMASK_HEROIC
        } else {
            SPAWNMASK_NORMAL
        }
    }

    pub fn is_dungeon(&self) -> bool {
        matches!(self.map_type, MapType::Instance | MapType::Raid)
    }
}

impl ContentRecord for MapEntry {
    type Key = u32;
    const TABLE: &'static str = "map_template";
    const NAME: &'static str = "maps";

    fn key(&self) -> u32 {
        self.id
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let id = row.u32(0)?;
        let raw_type = row.u8(2)?;
        let map_type = MapType::from_u8(raw_type)
            .ok_or_else(|| RowError::Invalid(format!("map {id} has unknown type {raw_type}")))?;
        Ok(Self {
            id,
            name: row.string(1)?,
            map_type,
            supports_heroic: row.bool(3)?,
        })
    }
}
