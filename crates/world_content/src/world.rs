//! The composition root: content, spatial index, respawn clocks and GUID
//! allocator of one world, plus the runtime operations that touch several
//! of them at once.

use crate::allocator::{IdentifierClass, ObjectGuidAllocator};
use crate::config::{ContentSettings, GuidSettings};
use crate::content::ContentStore;
use crate::error::{ContentError, GuidError, RowError, SpawnError, StorageError};
use crate::guid::{HighGuid, LowGuid, ObjectGuid};
use crate::respawn::{RespawnClock, Timestamp};
use crate::spatial::{SpatialIndex, SpawnKind, SpawnPosition};
use crate::spawns::{
    check_creature_spawn, check_gameobject_spawn, delete_creature_spawn_row,
    delete_gameobject_spawn_row, save_creature_spawn, save_gameobject_spawn, CreatureData,
    GameObjectData,
};
use crate::storage::Database;
use crate::templates::MovementType;
use crate::validation::ValidationReport;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

/// Character-store table of player corpses:
/// `guid, player, map, x, y, instance, corpse_type`. Bones (type 0) are not
/// indexed.
pub const CORPSE_TABLE: &str = "corpse";

/// Registry and clock sizes, for status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorldSummary {
    pub script_names: usize,
    pub creature_templates: usize,
    pub item_templates: usize,
    pub gameobject_templates: usize,
    pub quests: usize,
    pub creatures: usize,
    pub gameobjects: usize,
    pub cell_buckets: usize,
    pub creature_respawns: usize,
    pub gameobject_respawns: usize,
    pub violations: usize,
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} creature templates, {} items, {} gameobject templates, {} quests, \
             {} creatures, {} gameobjects in {} cells, {} + {} respawn times, \
             {} script names, {} content violations",
            self.creature_templates,
            self.item_templates,
            self.gameobject_templates,
            self.quests,
            self.creatures,
            self.gameobjects,
            self.cell_buckets,
            self.creature_respawns,
            self.gameobject_respawns,
            self.script_names,
            self.violations
        )
    }
}

pub struct World {
    world_db: Arc<dyn Database>,
    character_db: Arc<dyn Database>,
    settings: ContentSettings,
    content: ContentStore,
    index: SpatialIndex,
    allocator: ObjectGuidAllocator,
    creature_respawns: RespawnClock,
    gameobject_respawns: RespawnClock,
    report: ValidationReport,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("summary", &self.summary())
            .finish()
    }
}

impl World {
    /// Loads all content, recovers respawn times and corpses, and seeds the
    /// GUID allocator from both stores.
    pub fn open(
        world_db: Arc<dyn Database>,
        character_db: Arc<dyn Database>,
        content_settings: &ContentSettings,
        guid_settings: &GuidSettings,
    ) -> Result<Self, ContentError> {
        let index = SpatialIndex::new();
        let mut content = ContentStore::new();
        let report = content.load(world_db.as_ref(), false, content_settings, &index)?;

        let creature_respawns = RespawnClock::creature(Arc::clone(&character_db));
        creature_respawns.load()?;
        let gameobject_respawns = RespawnClock::gameobject(Arc::clone(&character_db));
        gameobject_respawns.load()?;

        let corpses = load_corpses(character_db.as_ref(), &index)?;
        info!(">> Loaded {} corpses", corpses);

        let allocator =
            ObjectGuidAllocator::from_databases(world_db.as_ref(), character_db.as_ref(), guid_settings)?;

        Ok(Self {
            world_db,
            character_db,
            settings: content_settings.clone(),
            content,
            index,
            allocator,
            creature_respawns,
            gameobject_respawns,
            report,
        })
    }

    /// Loads a new generation of every content registry in declared order and
    /// swaps it in only if the whole load succeeds. On error the previous
    /// generation stays in place. Identifier counters, respawn clocks and
    /// corpses keep their state.
    pub fn reload_content(&mut self) -> Result<&ValidationReport, ContentError> {
        info!("Reloading world content");
        let spawns = SpatialIndex::new();
        let mut content = ContentStore::new();
        let report = match content.load(self.world_db.as_ref(), true, &self.settings, &spawns) {
            Ok(report) => report,
            Err(e) => {
                error!("Content reload failed, keeping previous generation: {}", e);
                return Err(e);
            }
        };

        self.index.replace_spawns(spawns);
        self.content = content;
        self.report = report;
        Ok(&self.report)
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn allocator(&self) -> &ObjectGuidAllocator {
        &self.allocator
    }

    pub fn character_db(&self) -> &Arc<dyn Database> {
        &self.character_db
    }

    /// Violations found by the last (re)load.
    pub fn validation_report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn generate_low_guid(
        &self,
        class: IdentifierClass,
        temporary: bool,
    ) -> Result<LowGuid, GuidError> {
        self.allocator.generate_low_guid(class, temporary)
    }

    pub fn generate_guid(
        &self,
        high: HighGuid,
        entry: u32,
        temporary: bool,
    ) -> Result<ObjectGuid, GuidError> {
        self.allocator.generate_guid(high, entry, temporary)
    }

    pub fn creature_respawns(&self) -> &RespawnClock {
        &self.creature_respawns
    }

    pub fn gameobject_respawns(&self) -> &RespawnClock {
        &self.gameobject_respawns
    }

    pub fn get_creature_respawn_time(&self, guid: LowGuid, instance: u32) -> Timestamp {
        self.creature_respawns.get(guid, instance)
    }

    pub fn save_creature_respawn_time(
        &self,
        guid: LowGuid,
        map: u32,
        instance: u32,
        time: Timestamp,
    ) -> Result<(), StorageError> {
        self.creature_respawns.save(guid, map, instance, time)
    }

    pub fn get_gameobject_respawn_time(&self, guid: LowGuid, instance: u32) -> Timestamp {
        self.gameobject_respawns.get(guid, instance)
    }

    pub fn save_gameobject_respawn_time(
        &self,
        guid: LowGuid,
        map: u32,
        instance: u32,
        time: Timestamp,
    ) -> Result<(), StorageError> {
        self.gameobject_respawns.save(guid, map, instance, time)
    }

    /// Clears both respawn clocks of a torn-down instance.
    pub fn delete_respawn_times_for_instance(&self, instance: u32) -> Result<usize, StorageError> {
        let creatures = self.creature_respawns.delete_for_instance(instance)?;
        let gameobjects = self.gameobject_respawns.delete_for_instance(instance)?;
        Ok(creatures + gameobjects)
    }

    /// Places a new persistent creature spawn and writes it through.
    pub fn add_creature_spawn(
        &mut self,
        entry: u32,
        position: SpawnPosition,
        spawn_mask: u8,
        spawn_time_secs: u32,
    ) -> Result<LowGuid, SpawnError> {
        let template = self
            .content
            .creature_templates
            .get(&entry)
            .ok_or(SpawnError::UnknownTemplate(entry))?;
        if self.content.is_heroic_variant(entry) {
            return Err(SpawnError::HeroicVariant(entry));
        }
        let map = self
            .content
            .maps
            .get(&position.map)
            .ok_or(SpawnError::UnknownMap(position.map))?;
        if spawn_mask & map.valid_spawn_mask() == 0 {
            return Err(SpawnError::InvalidSpawnMask {
                map: position.map,
                mask: spawn_mask,
            });
        }
        let movement_type = match template.movement_type {
            MovementType::Random => MovementType::Idle,
            other => other,
        };

        let guid = self.allocator.generate_low_guid(IdentifierClass::Unit, false)?;
        let draft = CreatureData {
            guid,
            entry,
            position,
            spawn_mask,
            spawn_time_secs,
            spawn_dist: 0.0,
            cur_health: 1,
            movement_type,
        };
        let Some(data) = check_creature_spawn(
            draft,
            &self.content.creature_templates,
            self.content.heroic_variants(),
            &self.content.maps,
        ) else {
            return Err(SpawnError::UnknownTemplate(entry));
        };

        save_creature_spawn(self.world_db.as_ref(), &data)?;
        self.index
            .add_spawn(SpawnKind::Creature, guid, &data.position, data.spawn_mask);
        self.content.creatures.insert(data);
        info!("Added creature spawn {} (entry {})", guid, entry);
        Ok(guid)
    }

    /// Removes a creature spawn from the index, the registry and the store.
    /// Returns `false` if no such spawn exists.
    pub fn delete_creature_spawn(&mut self, guid: LowGuid) -> Result<bool, StorageError> {
        let Some(data) = self.content.creatures.get(&guid) else {
            return Ok(false);
        };
        self.index
            .remove_spawn(SpawnKind::Creature, guid, &data.position, data.spawn_mask);
        self.content.creatures.remove(&guid);
        delete_creature_spawn_row(self.world_db.as_ref(), guid)?;
        Ok(true)
    }

    /// Places a new persistent game object spawn and writes it through.
    pub fn add_gameobject_spawn(
        &mut self,
        entry: u32,
        position: SpawnPosition,
        rotation: [f32; 4],
        spawn_mask: u8,
        spawn_time_secs: i32,
    ) -> Result<LowGuid, SpawnError> {
        if !self.content.gameobject_templates.contains(&entry) {
            return Err(SpawnError::UnknownTemplate(entry));
        }
        let map = self
            .content
            .maps
            .get(&position.map)
            .ok_or(SpawnError::UnknownMap(position.map))?;
        if spawn_mask & map.valid_spawn_mask() == 0 {
            return Err(SpawnError::InvalidSpawnMask {
                map: position.map,
                mask: spawn_mask,
            });
        }

        let guid = self
            .allocator
            .generate_low_guid(IdentifierClass::GameObject, false)?;
        let draft = GameObjectData {
            guid,
            entry,
            position,
            spawn_mask,
            rotation,
            spawn_time_secs,
            anim_progress: 100,
            go_state: 1,
        };
        let Some(data) =
            check_gameobject_spawn(draft, &self.content.gameobject_templates, &self.content.maps)
        else {
            return Err(SpawnError::UnknownTemplate(entry));
        };

        save_gameobject_spawn(self.world_db.as_ref(), &data)?;
        self.index
            .add_spawn(SpawnKind::GameObject, guid, &data.position, data.spawn_mask);
        self.content.gameobjects.insert(data);
        info!("Added gameobject spawn {} (entry {})", guid, entry);
        Ok(guid)
    }

    pub fn delete_gameobject_spawn(&mut self, guid: LowGuid) -> Result<bool, StorageError> {
        let Some(data) = self.content.gameobjects.get(&guid) else {
            return Ok(false);
        };
        self.index
            .remove_spawn(SpawnKind::GameObject, guid, &data.position, data.spawn_mask);
        self.content.gameobjects.remove(&guid);
        delete_gameobject_spawn_row(self.world_db.as_ref(), guid)?;
        Ok(true)
    }

    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            script_names: self.content.scripts.len(),
            creature_templates: self.content.creature_templates.len(),
            item_templates: self.content.item_templates.len(),
            gameobject_templates: self.content.gameobject_templates.len(),
            quests: self.content.quest_templates.len(),
            creatures: self.content.creatures.len(),
            gameobjects: self.content.gameobjects.len(),
            cell_buckets: self.index.bucket_count(),
            creature_respawns: self.creature_respawns.len(),
            gameobject_respawns: self.gameobject_respawns.len(),
            violations: self.report.len(),
        }
    }
}

/// Indexes every non-bones corpse of the character store.
fn load_corpses(db: &dyn Database, index: &SpatialIndex) -> Result<usize, StorageError> {
    let Some(result) = db.query(CORPSE_TABLE)? else {
        return Ok(0);
    };

    let mut count = 0;
    for row in result.rows() {
        let decoded = (|| {
            Ok::<_, RowError>((
                row.u32(1)?,
                row.u32(2)?,
                row.f32(3)?,
                row.f32(4)?,
                row.u32(5)?,
                row.u8(6)?,
            ))
        })();
        match decoded {
            Ok((_, _, _, _, _, 0)) => {}
            Ok((player, map, x, y, instance, _)) => {
                index.add_corpse(player, map, x, y, instance);
                count += 1;
            }
            Err(e) => error!("Table `{}` row skipped: {}", CORPSE_TABLE, e),
        }
    }
    Ok(count)
}
