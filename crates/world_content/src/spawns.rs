//! Placed creature and game object spawns.
//!
//! Spawn rows are decoded structurally by [`ContentRecord::from_row`] and
//! then checked against the templates and maps they name. Surviving spawns
//! are inserted and registered in the spatial index.

use crate::error::{RowError, StorageError};
use crate::guid::LowGuid;
use crate::registry::{ContentRecord, ContentRegistry, LoadContext};
use crate::spatial::{SpatialIndex, SpawnKind, SpawnPosition};
use crate::storage::{Database, Field, Row, Statement};
use crate::templates::{CreatureTemplate, GameObjectTemplate, MapEntry, MovementType};
use std::collections::HashSet;
use tracing::{error, info};

/// One row of `creature`.
///
/// Columns: `guid, id, map, spawn_mask, x, y, z, o, spawntimesecs,
/// spawndist, curhealth, movement_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureData {
    pub guid: LowGuid,
    pub entry: u32,
    pub position: SpawnPosition,
    pub spawn_mask: u8,
    pub spawn_time_secs: u32,
    pub spawn_dist: f32,
    pub cur_health: u32,
    pub movement_type: MovementType,
}

impl CreatureData {
    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Field::from(self.guid),
            Field::from(self.entry),
            Field::from(self.position.map),
            Field::from(self.spawn_mask),
            Field::from(self.position.x),
            Field::from(self.position.y),
            Field::from(self.position.z),
            Field::from(self.position.orientation),
            Field::from(self.spawn_time_secs),
            Field::from(self.spawn_dist),
            Field::from(self.cur_health),
            Field::from(self.movement_type as u8),
        ])
    }
}

fn position(row: &Row) -> Result<SpawnPosition, RowError> {
    Ok(SpawnPosition {
        map: row.u32(2)?,
        x: row.f32(4)?,
        y: row.f32(5)?,
        z: row.f32(6)?,
        orientation: row.f32(7)?,
    })
}

impl ContentRecord for CreatureData {
    type Key = LowGuid;
    const TABLE: &'static str = "creature";
    const NAME: &'static str = "creatures";

    fn key(&self) -> LowGuid {
        self.guid
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let guid = row.u32(0)?;
        let raw_movement = row.u8(11)?;
        let movement_type = MovementType::from_u8(raw_movement).ok_or_else(|| {
            RowError::Invalid(format!("creature {guid} has invalid movement_type {raw_movement}"))
        })?;

        let mut spawn_dist = row.f32(9)?;
        if spawn_dist < 0.0 {
            error!("Creature (GUID: {}) has spawndist < 0, set to 0", guid);
            spawn_dist = 0.0;
        }

        Ok(Self {
            guid,
            entry: row.u32(1)?,
            position: position(row)?,
            spawn_mask: row.u8(3)?,
            spawn_time_secs: row.u32(8)?,
            spawn_dist,
            cur_health: row.u32(10)?,
            movement_type,
        })
    }
}

/// One row of `gameobject`.
///
/// Columns: `guid, id, map, spawn_mask, x, y, z, o, rot0, rot1, rot2,
/// rot3, spawntimesecs, animprogress, state`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObjectData {
    pub guid: LowGuid,
    pub entry: u32,
    pub position: SpawnPosition,
    pub spawn_mask: u8,
    pub rotation: [f32; 4],
    pub spawn_time_secs: i32,
    pub anim_progress: u32,
    pub go_state: u8,
}

impl GameObjectData {
    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Field::from(self.guid),
            Field::from(self.entry),
            Field::from(self.position.map),
            Field::from(self.spawn_mask),
            Field::from(self.position.x),
            Field::from(self.position.y),
            Field::from(self.position.z),
            Field::from(self.position.orientation),
            Field::from(self.rotation[0]),
            Field::from(self.rotation[1]),
            Field::from(self.rotation[2]),
            Field::from(self.rotation[3]),
            Field::from(self.spawn_time_secs),
            Field::from(self.anim_progress),
            Field::from(self.go_state),
        ])
    }
}

impl ContentRecord for GameObjectData {
    type Key = LowGuid;
    const TABLE: &'static str = "gameobject";
    const NAME: &'static str = "gameobjects";

    fn key(&self) -> LowGuid {
        self.guid
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let guid = row.u32(0)?;
        let mut go_state = row.u8(14)?;
        if go_state > 2 {
            error!("Gameobject (GUID: {}) has invalid state {}, set to ready", guid, go_state);
            go_state = 1;
        }
        Ok(Self {
            guid,
            entry: row.u32(1)?,
            position: position(row)?,
            spawn_mask: row.u8(3)?,
            rotation: [row.f32(8)?, row.f32(9)?, row.f32(10)?, row.f32(11)?],
            spawn_time_secs: row.i32(12)?,
            anim_progress: row.u32(13)?,
            go_state,
        })
    }
}

/// Drops spawn-mask bits the map does not have. Returns `None` if the map
/// is unknown.
fn trim_spawn_mask(
    table: &str,
    guid: LowGuid,
    map_id: u32,
    spawn_mask: u8,
    maps: &ContentRegistry<MapEntry>,
) -> Option<u8> {
    let Some(map) = maps.get(&map_id) else {
        error!(
            "Table `{}` has spawn (GUID: {}) on non-existing map {}, skipped.",
            table, guid, map_id
        );
        return None;
    };
    let valid = map.valid_spawn_mask();
    if spawn_mask & !valid != 0 {
        error!(
            "Table `{}` has spawn (GUID: {}) with spawn_mask {:#x} not supported by map {}, trimmed to {:#x}.",
            table,
            guid,
            spawn_mask,
            map_id,
            spawn_mask & valid
        );
    }
    Some(spawn_mask & valid)
}

/// Applies the template and map checks to a decoded creature spawn.
pub fn check_creature_spawn(
    mut data: CreatureData,
    templates: &ContentRegistry<CreatureTemplate>,
    heroic_variants: &HashSet<u32>,
    maps: &ContentRegistry<MapEntry>,
) -> Option<CreatureData> {
    if !templates.contains(&data.entry) {
        error!(
            "Table `creature` has creature (GUID: {}) with non-existing creature entry {}, skipped.",
            data.guid, data.entry
        );
        return None;
    }
    if heroic_variants.contains(&data.entry) {
        error!(
            "Table `creature` has creature (GUID: {}) that uses heroic-mode template {}, skipped.",
            data.guid, data.entry
        );
        return None;
    }
    data.spawn_mask = trim_spawn_mask(
        "creature",
        data.guid,
        data.position.map,
        data.spawn_mask,
        maps,
    )?;

    if data.movement_type == MovementType::Random && data.spawn_dist == 0.0 {
        error!(
            "Table `creature` has creature (GUID: {} Entry: {}) with random movement but zero spawndist, set to idle.",
            data.guid, data.entry
        );
        data.movement_type = MovementType::Idle;
    } else if data.movement_type == MovementType::Idle && data.spawn_dist != 0.0 {
        data.spawn_dist = 0.0;
    }
    Some(data)
}

pub fn check_gameobject_spawn(
    mut data: GameObjectData,
    templates: &ContentRegistry<GameObjectTemplate>,
    maps: &ContentRegistry<MapEntry>,
) -> Option<GameObjectData> {
    if !templates.contains(&data.entry) {
        error!(
            "Table `gameobject` has gameobject (GUID: {}) with non-existing gameobject entry {}, skipped.",
            data.guid, data.entry
        );
        return None;
    }
    data.spawn_mask = trim_spawn_mask(
        "gameobject",
        data.guid,
        data.position.map,
        data.spawn_mask,
        maps,
    )?;
    Some(data)
}

/// Loads `creature` and registers every spawn in `index`.
#[allow(clippy::too_many_arguments)]
pub fn load_creature_spawns(
    registry: &mut ContentRegistry<CreatureData>,
    db: &dyn Database,
    reload: bool,
    ctx: &LoadContext<'_>,
    templates: &ContentRegistry<CreatureTemplate>,
    heroic_variants: &HashSet<u32>,
    maps: &ContentRegistry<MapEntry>,
    index: &SpatialIndex,
) -> Result<usize, StorageError> {
    if reload {
        for data in registry.iter().map(|(_, data)| data) {
            index.remove_spawn(SpawnKind::Creature, data.guid, &data.position, data.spawn_mask);
        }
        registry.clear();
    }

    let Some(result) = db.query(CreatureData::TABLE)? else {
        info!(">> Loaded 0 creatures. DB table `creature` is empty.");
        return Ok(0);
    };

    for row in result.rows() {
        let data = match CreatureData::from_row(row, ctx) {
            Ok(data) => data,
            Err(e) => {
                error!("Table `creature` row skipped: {}", e);
                continue;
            }
        };
        let Some(data) = check_creature_spawn(data, templates, heroic_variants, maps) else {
            continue;
        };
        if let Some(previous) = registry.get(&data.guid) {
            index.remove_spawn(
                SpawnKind::Creature,
                previous.guid,
                &previous.position,
                previous.spawn_mask,
            );
        }
        index.add_spawn(SpawnKind::Creature, data.guid, &data.position, data.spawn_mask);
        registry.insert(data);
    }

    info!(">> Loaded {} creatures", registry.len());
    Ok(registry.len())
}

/// Loads `gameobject` and registers every spawn in `index`.
pub fn load_gameobject_spawns(
    registry: &mut ContentRegistry<GameObjectData>,
    db: &dyn Database,
    reload: bool,
    ctx: &LoadContext<'_>,
    templates: &ContentRegistry<GameObjectTemplate>,
    maps: &ContentRegistry<MapEntry>,
    index: &SpatialIndex,
) -> Result<usize, StorageError> {
    if reload {
        for data in registry.iter().map(|(_, data)| data) {
            index.remove_spawn(SpawnKind::GameObject, data.guid, &data.position, data.spawn_mask);
        }
        registry.clear();
    }

    let Some(result) = db.query(GameObjectData::TABLE)? else {
        info!(">> Loaded 0 gameobjects. DB table `gameobject` is empty.");
        return Ok(0);
    };

    for row in result.rows() {
        let data = match GameObjectData::from_row(row, ctx) {
            Ok(data) => data,
            Err(e) => {
                error!("Table `gameobject` row skipped: {}", e);
                continue;
            }
        };
        let Some(data) = check_gameobject_spawn(data, templates, maps) else {
            continue;
        };
        if let Some(previous) = registry.get(&data.guid) {
            index.remove_spawn(
                SpawnKind::GameObject,
                previous.guid,
                &previous.position,
                previous.spawn_mask,
            );
        }
        index.add_spawn(SpawnKind::GameObject, data.guid, &data.position, data.spawn_mask);
        registry.insert(data);
    }

    info!(">> Loaded {} gameobjects", registry.len());
    Ok(registry.len())
}

/// Write-through of a new or changed creature spawn.
pub fn save_creature_spawn(db: &dyn Database, data: &CreatureData) -> Result<(), StorageError> {
    db.execute(Statement::Replace {
        table: CreatureData::TABLE,
        key_columns: 1,
        row: data.to_row(),
    })
}

pub fn delete_creature_spawn_row(db: &dyn Database, guid: LowGuid) -> Result<(), StorageError> {
    db.execute(Statement::Delete {
        table: CreatureData::TABLE,
        filter: vec![(0, Field::from(guid))],
    })
}

pub fn save_gameobject_spawn(db: &dyn Database, data: &GameObjectData) -> Result<(), StorageError> {
    db.execute(Statement::Replace {
        table: GameObjectData::TABLE,
        key_columns: 1,
        row: data.to_row(),
    })
}

pub fn delete_gameobject_spawn_row(db: &dyn Database, guid: LowGuid) -> Result<(), StorageError> {
    db.execute(Statement::Delete {
        table: GameObjectData::TABLE,
        filter: vec![(0, Field::from(guid))],
    })
}
