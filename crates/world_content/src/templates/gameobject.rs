use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;
use tracing::error;

pub const GAMEOBJECT_TYPE_TEXT: u8 = 9;
pub const GAMEOBJECT_TYPE_GOOBER: u8 = 10;
pub const GAMEOBJECT_TYPE_SPELLCASTER: u8 = 22;
pub const MAX_GAMEOBJECT_TYPE: u8 = 36;

/// Number of type-dependent data columns.
pub const GAMEOBJECT_DATA_FIELDS: usize = 8;

/// One row of `gameobject_template`.
///
/// Columns: `entry, type, display_id, name, faction, flags, size,
/// data0..data7, ScriptName`. The meaning of `data` depends on `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObjectTemplate {
    pub entry: u32,
    pub kind: u8,
    pub display_id: u32,
    pub name: String,
    pub faction: u32,
    pub flags: u32,
    pub size: f32,
    pub data: [u32; GAMEOBJECT_DATA_FIELDS],
    pub script_id: u32,
}

impl ContentRecord for GameObjectTemplate {
    type Key = u32;
    const TABLE: &'static str = "gameobject_template";
    const NAME: &'static str = "game object templates";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let entry = row.u32(0)?;
        let kind = row.u8(1)?;
        if kind >= MAX_GAMEOBJECT_TYPE {
            return Err(RowError::Invalid(format!(
                "gameobject {entry} has unknown type {kind}"
            )));
        }

        let mut size = row.f32(6)?;
        if size <= 0.0 {
            error!("Gameobject (Entry: {}) has size {}, set to 1", entry, size);
            size = 1.0;
        }

        let mut data = [0u32; GAMEOBJECT_DATA_FIELDS];
        for (index, slot) in data.iter_mut().enumerate() {
            *slot = row.u32(7 + index)?;
        }

        Ok(Self {
            entry,
            kind,
            display_id: row.u32(2)?,
            name: row.string(3)?,
            faction: row.u32(4)?,
            flags: row.u32(5)?,
            size,
            data,
            script_id: ctx.scripts.get_script_id(&row.string(15)?),
        })
    }
}
