//! Grid-cell membership of spawns and corpses.
//!
//! A map is a 64x64 grid of 533.33 yard squares, each split into 8x8 cells,
//! so every map has 512x512 cells with cell 256 at the world origin. Spawns
//! are bucketed under `(map, mode, cell)` once per set spawn-mask bit.
//! Corpses are bucketed under mode 0 only.

use crate::guid::LowGuid;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const MAX_NUMBER_OF_GRIDS: u32 = 64;
pub const SIZE_OF_GRIDS: f64 = 533.333_33;
pub const MAX_NUMBER_OF_CELLS: u32 = 8;
pub const SIZE_OF_GRID_CELL: f64 = SIZE_OF_GRIDS / MAX_NUMBER_OF_CELLS as f64;
pub const TOTAL_NUMBER_OF_CELLS_PER_MAP: u32 = MAX_NUMBER_OF_GRIDS * MAX_NUMBER_OF_CELLS;
pub const CENTER_GRID_CELL_ID: u32 = TOTAL_NUMBER_OF_CELLS_PER_MAP / 2;
pub const CENTER_GRID_CELL_OFFSET: f64 = SIZE_OF_GRID_CELL / 2.0;

/// Number of spawn-mask bits.
pub const MAX_SPAWN_MODES: u8 = 8;

/// Where a spawn stands.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpawnPosition {
    pub map: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub orientation: f32,
}

/// Cell coordinates on one map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPair {
    pub x: u32,
    pub y: u32,
}

impl CellPair {
    pub fn id(self) -> u32 {
        self.y * TOTAL_NUMBER_OF_CELLS_PER_MAP + self.x
    }
}

fn cell_coord(value: f32) -> u32 {
    let offset = (f64::from(value) - CENTER_GRID_CELL_OFFSET) / SIZE_OF_GRID_CELL;
    let coord = (offset + f64::from(CENTER_GRID_CELL_ID) + 0.5) as i64;
    coord.clamp(0, i64::from(TOTAL_NUMBER_OF_CELLS_PER_MAP - 1)) as u32
}

/// Cell containing world position `(x, y)`. Positions beyond the map edge
/// fall into the border cells.
pub fn compute_cell_pair(x: f32, y: f32) -> CellPair {
    CellPair {
        x: cell_coord(x),
        y: cell_coord(y),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub map: u32,
    pub mode: u8,
    pub cell: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Creature,
    GameObject,
}

/// Everything registered in one cell of one map mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGuids {
    pub creatures: BTreeSet<LowGuid>,
    pub gameobjects: BTreeSet<LowGuid>,
    /// Player low GUID to instance id.
    pub corpses: HashMap<LowGuid, u32>,
}

impl CellGuids {
    pub fn is_empty(&self) -> bool {
        self.creatures.is_empty() && self.gameobjects.is_empty() && self.corpses.is_empty()
    }

    fn set_mut(&mut self, kind: SpawnKind) -> &mut BTreeSet<LowGuid> {
        match kind {
            SpawnKind::Creature => &mut self.creatures,
            SpawnKind::GameObject => &mut self.gameobjects,
        }
    }
}

fn set_modes(spawn_mask: u8) -> impl Iterator<Item = u8> {
    (0..MAX_SPAWN_MODES).filter(move |mode| spawn_mask & (1 << mode) != 0)
}

#[derive(Debug, Default)]
pub struct SpatialIndex {
    cells: DashMap<CellKey, CellGuids>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `guid` in every mode selected by `spawn_mask`.
    pub fn add_spawn(
        &self,
        kind: SpawnKind,
        guid: LowGuid,
        position: &SpawnPosition,
        spawn_mask: u8,
    ) {
        let cell = compute_cell_pair(position.x, position.y).id();
        for mode in set_modes(spawn_mask) {
            let key = CellKey {
                map: position.map,
                mode,
                cell,
            };
            self.cells.entry(key).or_default().set_mut(kind).insert(guid);
        }
    }

    /// Exact inverse of [`add_spawn`](Self::add_spawn) for the same arguments.
    pub fn remove_spawn(
        &self,
        kind: SpawnKind,
        guid: LowGuid,
        position: &SpawnPosition,
        spawn_mask: u8,
    ) {
        let cell = compute_cell_pair(position.x, position.y).id();
        for mode in set_modes(spawn_mask) {
            let key = CellKey {
                map: position.map,
                mode,
                cell,
            };
            if let Some(mut bucket) = self.cells.get_mut(&key) {
                bucket.set_mut(kind).remove(&guid);
            }
            self.cells.remove_if(&key, |_, bucket| bucket.is_empty());
        }
    }

    pub fn add_corpse(&self, player: LowGuid, map: u32, x: f32, y: f32, instance: u32) {
        let key = CellKey {
            map,
            mode: 0,
            cell: compute_cell_pair(x, y).id(),
        };
        self.cells
            .entry(key)
            .or_default()
            .corpses
            .insert(player, instance);
    }

    pub fn remove_corpse(&self, player: LowGuid, map: u32, x: f32, y: f32) {
        let key = CellKey {
            map,
            mode: 0,
            cell: compute_cell_pair(x, y).id(),
        };
        if let Some(mut bucket) = self.cells.get_mut(&key) {
            bucket.corpses.remove(&player);
        }
        self.cells.remove_if(&key, |_, bucket| bucket.is_empty());
    }

    /// Drops all creature and game object entries, keeping corpses.
    pub fn clear_spawns(&self) {
        self.cells.retain(|_, bucket| {
            bucket.creatures.clear();
            bucket.gameobjects.clear();
            !bucket.is_empty()
        });
    }

    /// Replaces every creature and game object entry with the spawns of
    /// `fresh`. Corpses stay as they are.
    pub fn replace_spawns(&self, fresh: SpatialIndex) {
        self.clear_spawns();
        for (key, spawns) in fresh.cells {
            let mut bucket = self.cells.entry(key).or_default();
            bucket.creatures.extend(spawns.creatures);
            bucket.gameobjects.extend(spawns.gameobjects);
        }
    }

    /// Snapshot of one bucket.
    pub fn cell_guids(&self, map: u32, mode: u8, cell: u32) -> Option<CellGuids> {
        self.cells
            .get(&CellKey { map, mode, cell })
            .map(|bucket| bucket.value().clone())
    }

    pub fn bucket_count(&self) -> usize {
        self.cells.len()
    }

    /// Ordered copy of the whole index.
    pub fn snapshot(&self) -> BTreeMap<CellKey, CellGuids> {
        self.cells
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}
