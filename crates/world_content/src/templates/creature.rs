use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;
use tracing::error;

/// Highest valid creature rank (world boss).
pub const MAX_CREATURE_RANK: u8 = 4;

/// Number of creature spell slots.
pub const CREATURE_MAX_SPELLS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementType {
    Idle,
    Random,
    Waypoint,
}

impl MovementType {
    pub fn from_u8(value: u8) -> Option<MovementType> {
        match value {
            0 => Some(MovementType::Idle),
            1 => Some(MovementType::Random),
            2 => Some(MovementType::Waypoint),
            _ => None,
        }
    }
}

/// One row of `creature_template`.
///
/// Columns: `entry, heroic_entry, display_id, name, subname, gossip_menu_id,
/// min_level, max_level, faction, npc_flags, rank, speed_walk, scale,
/// spell1, spell2, spell3, spell4, trainer_spell, movement_type, ScriptName`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureTemplate {
    pub entry: u32,
    pub heroic_entry: u32,
    pub display_id: u32,
    pub name: String,
    pub subname: String,
    pub gossip_menu_id: u32,
    pub min_level: u8,
    pub max_level: u8,
    pub faction: u32,
    pub npc_flags: u32,
    pub rank: u8,
    pub speed_walk: f32,
    pub scale: f32,
    pub spells: [u32; CREATURE_MAX_SPELLS],
    pub trainer_spell: u32,
    pub movement_type: MovementType,
    pub script_id: u32,
}

impl ContentRecord for CreatureTemplate {
    type Key = u32;
    const TABLE: &'static str = "creature_template";
    const NAME: &'static str = "creature templates";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let entry = row.u32(0)?;

        let mut min_level = row.u8(6)?;
        let mut max_level = row.u8(7)?;
        if min_level == 0 {
            error!("Creature (Entry: {}) has min_level 0, set to 1", entry);
            min_level = 1;
        }
        if max_level < min_level {
            error!(
                "Creature (Entry: {}) has max_level {} below min_level {}, set to {}",
                entry, max_level, min_level, min_level
            );
            max_level = min_level;
        }

        let mut rank = row.u8(10)?;
        if rank > MAX_CREATURE_RANK {
            error!("Creature (Entry: {}) has invalid rank {}, set to normal", entry, rank);
            rank = 0;
        }

        let mut speed_walk = row.f32(11)?;
        if speed_walk <= 0.0 {
            speed_walk = 1.0;
        }
        let mut scale = row.f32(12)?;
        if scale <= 0.0 {
            scale = 1.0;
        }

        let raw_movement = row.u8(18)?;
        let movement_type = MovementType::from_u8(raw_movement).unwrap_or_else(|| {
            error!(
                "Creature (Entry: {}) has invalid movement_type {}, set to idle",
                entry, raw_movement
            );
            MovementType::Idle
        });

        Ok(Self {
            entry,
            heroic_entry: row.u32(1)?,
            display_id: row.u32(2)?,
            name: row.string(3)?,
            subname: row.string(4)?,
            gossip_menu_id: row.u32(5)?,
            min_level,
            max_level,
            faction: row.u32(8)?,
            npc_flags: row.u32(9)?,
            rank,
            speed_walk,
            scale,
            spells: [row.u32(13)?, row.u32(14)?, row.u32(15)?, row.u32(16)?],
            trainer_spell: row.u32(17)?,
            movement_type,
            script_id: ctx.scripts.get_script_id(&row.string(19)?),
        })
    }
}
