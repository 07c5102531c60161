use crate::allocator::IdentifierClass;
use crate::config::{ContentSettings, GuidSettings};
use crate::error::{ContentError, SpawnError};
use crate::locale::Locale;
use crate::respawn::CREATURE_RESPAWN_TABLE;
use crate::row;
use crate::spatial::{compute_cell_pair, SpawnPosition};
use crate::storage::{Database, Field, MemoryDatabase, Row};
use crate::templates::quest::fixtures::quest_row;
use crate::world::World;
use std::sync::Arc;

const EASTERN_KINGDOMS: u32 = 0;
const BLACK_MORASS: u32 = 269;

fn creature_template(entry: u32, heroic: u32, name: &str, faction: u32, script: &str) -> Row {
    row![
        entry, heroic, 0, name, "", 0, 1, 2, faction, 0, 0, 1.0_f32, 1.0_f32, 133, 0, 0, 0, 0, 0,
        script
    ]
}

fn creature_spawn(guid: u32, entry: u32, map: u32, mask: u8, x: f32, y: f32) -> Row {
    row![guid, entry, map, mask, x, y, 0.0_f32, 0.0_f32, 300, 0.0_f32, 100, 0]
}

fn world_db() -> Arc<MemoryDatabase> {
    let db = MemoryDatabase::new();
    db.insert_rows("spell_template", vec![row![133, 2, "Fireball"]]);
    db.insert_rows("faction_template", vec![row![7, 148, 0, 0], row![14, 16, 0, 1]]);
    db.insert_rows(
        "map_template",
        vec![
            row![EASTERN_KINGDOMS, "Eastern Kingdoms", 0, false],
            row![BLACK_MORASS, "The Black Morass", 1, true],
        ],
    );
    db.insert_rows(
        "creature_template",
        vec![
            creature_template(299, 0, "Diseased Young Wolf", 7, "npc_young_wolf"),
            creature_template(17881, 20531, "Aeonus", 14, "boss_aeonus"),
            creature_template(20531, 0, "Aeonus (1)", 14, ""),
        ],
    );
    db.insert_rows(
        "creature",
        vec![
            creature_spawn(10, 299, EASTERN_KINGDOMS, 1, -9000.0, 300.0),
            creature_spawn(11, 20531, BLACK_MORASS, 3, 0.0, 0.0),
            creature_spawn(12, 17881, BLACK_MORASS, 3, -1500.0, 7000.0),
            creature_spawn(13, 299, EASTERN_KINGDOMS, 3, -9010.0, 310.0),
            creature_spawn(14, 9999, EASTERN_KINGDOMS, 1, 0.0, 0.0),
        ],
    );
    db.insert_rows(
        "gameobject_template",
        vec![row![
            1731, 3, 310, "Copper Vein", 0, 0, 1.0_f32, 43, 0, 0, 0, 0, 0, 0, 0, ""
        ]],
    );
    db.insert_rows(
        "gameobject",
        vec![row![
            5, 1731, EASTERN_KINGDOMS, 1, -9050.0_f32, 250.0_f32, 0.0_f32, 0.0_f32, 0.0_f32,
            0.0_f32, 0.0_f32, 1.0_f32, 900, 100, 1
        ]],
    );
    db.insert_rows("quest_template", vec![quest_row(33, 133)]);
    db.insert_rows(
        "player_levelstats",
        vec![row![1, 1, 1, 23, 20, 22, 20, 20], row![1, 1, 2, 24, 21, 23, 20, 20]],
    );
    db.insert_rows(
        "creature_template_locale",
        vec![row![299, "deDE", "Räudiger junger Wolf", ""]],
    );
    Arc::new(db)
}

fn character_db() -> Arc<MemoryDatabase> {
    let db = MemoryDatabase::new();
    db.insert_rows(CREATURE_RESPAWN_TABLE, vec![row![10, 0, 5000, EASTERN_KINGDOMS]]);
    db.insert_rows("corpse", vec![row![1, 4, EASTERN_KINGDOMS, 10.0_f32, 10.0_f32, 0, 1]]);
    db.insert_rows("item_instance", vec![row![41], row![7]]);
    Arc::new(db)
}

fn open(world: &Arc<MemoryDatabase>, characters: &Arc<MemoryDatabase>) -> World {
    World::open(
        world.clone(),
        characters.clone(),
        &ContentSettings::default(),
        &GuidSettings::default(),
    )
    .unwrap()
}

fn cell_of(x: f32, y: f32) -> u32 {
    compute_cell_pair(x, y).id()
}

#[test]
fn test_open_loads_and_indexes_content() {
    let (world_db, character_db) = (world_db(), character_db());
    let world = open(&world_db, &character_db);
    let content = world.content();

    assert_eq!(content.creature_templates.len(), 3);
    assert_eq!(content.creatures.len(), 3);
    assert!(!content.creatures.contains(&11));
    assert!(!content.creatures.contains(&14));
    assert_eq!(content.creatures.get(&13).unwrap().spawn_mask, 1);
    assert_eq!(content.creature_script_name(299), Some("npc_young_wolf"));
    assert!(world.validation_report().is_empty());

    let index = world.spatial_index();
    let wolf = index
        .cell_guids(EASTERN_KINGDOMS, 0, cell_of(-9000.0, 300.0))
        .unwrap();
    assert!(wolf.creatures.contains(&10));
    for mode in [0, 1] {
        let boss = index
            .cell_guids(BLACK_MORASS, mode, cell_of(-1500.0, 7000.0))
            .unwrap();
        assert!(boss.creatures.contains(&12));
    }
    let corpse = index
        .cell_guids(EASTERN_KINGDOMS, 0, cell_of(10.0, 10.0))
        .unwrap();
    assert_eq!(corpse.corpses.get(&4), Some(&0));

    assert_eq!(world.get_creature_respawn_time(10, 0), 5000);
}

#[test]
fn test_allocator_is_seeded_from_both_stores() {
    let (world_db, character_db) = (world_db(), character_db());
    let world = open(&world_db, &character_db);

    assert_eq!(world.generate_low_guid(IdentifierClass::Item, false).unwrap(), 42);
    // Highest creature row, including rows dropped by the loader.
    assert_eq!(world.generate_low_guid(IdentifierClass::Unit, false).unwrap(), 15);
    let temporary = world.generate_low_guid(IdentifierClass::Unit, true).unwrap();
    assert!(world
        .allocator()
        .is_in_temporary_range(IdentifierClass::Unit, temporary));
    assert_eq!(world.generate_low_guid(IdentifierClass::Pet, false).unwrap(), 1);
}

#[test]
fn test_reload_is_idempotent() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let summary = world.summary();
    let snapshot = world.spatial_index().snapshot();

    world.reload_content().unwrap();
    world.reload_content().unwrap();

    assert_eq!(world.summary(), summary);
    assert_eq!(world.spatial_index().snapshot(), snapshot);
}

#[test]
fn test_reload_drops_removed_rows_and_keeps_counters() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let before = world.generate_low_guid(IdentifierClass::Unit, false).unwrap();

    world_db
        .execute(crate::storage::Statement::Delete {
            table: "creature",
            filter: vec![(0, Field::from(10))],
        })
        .unwrap();
    world.reload_content().unwrap();

    assert!(!world.content().creatures.contains(&10));
    assert!(world
        .spatial_index()
        .cell_guids(EASTERN_KINGDOMS, 0, cell_of(-9000.0, 300.0))
        .map(|cell| !cell.creatures.contains(&10))
        .unwrap_or(true));
    assert_eq!(
        world.generate_low_guid(IdentifierClass::Unit, false).unwrap(),
        before + 1
    );
    // Corpses survive a content reload.
    assert!(world
        .spatial_index()
        .cell_guids(EASTERN_KINGDOMS, 0, cell_of(10.0, 10.0))
        .is_some());
}

#[test]
fn test_failed_reload_keeps_previous_generation() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let summary = world.summary();
    let snapshot = world.spatial_index().snapshot();

    world_db.push_row(
        "creature_template",
        creature_template(3000, 0, "Stray", 999, ""),
    );
    world_db.push_row(
        "creature",
        creature_spawn(50, 3000, EASTERN_KINGDOMS, 1, 500.0, 500.0),
    );

    let err = world.reload_content().unwrap_err();
    assert!(matches!(err, ContentError::Integrity { entry: 3000, .. }));
    assert!(!world.content().creature_templates.contains(&3000));
    assert!(!world.content().creatures.contains(&50));
    assert_eq!(world.summary(), summary);
    assert_eq!(world.spatial_index().snapshot(), snapshot);
}

#[test]
fn test_self_referencing_heroic_entry_is_spawnable() {
    let world_db = world_db();
    world_db.push_row(
        "creature_template",
        creature_template(3001, 3001, "Mirror Image", 7, ""),
    );
    world_db.push_row(
        "creature",
        creature_spawn(60, 3001, EASTERN_KINGDOMS, 1, 40.0, 40.0),
    );
    let world = open(&world_db, &character_db());

    assert!(!world.content().is_heroic_variant(3001));
    assert!(world.content().creatures.contains(&60));
    assert_eq!(
        world.content().creature_templates.get(&3001).unwrap().heroic_entry,
        0
    );
    assert_eq!(world.validation_report().len(), 1);
}

#[test]
fn test_add_and_delete_creature_spawn() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let position = SpawnPosition {
        map: EASTERN_KINGDOMS,
        x: 120.0,
        y: -40.0,
        z: 5.0,
        orientation: 1.5,
    };

    let guid = world.add_creature_spawn(299, position, 1, 120).unwrap();
    assert!(!world
        .allocator()
        .is_in_temporary_range(IdentifierClass::Unit, guid));
    assert_eq!(world_db.row_count("creature"), 6);
    let cell = cell_of(120.0, -40.0);
    assert!(world
        .spatial_index()
        .cell_guids(EASTERN_KINGDOMS, 0, cell)
        .unwrap()
        .creatures
        .contains(&guid));

    assert!(world.delete_creature_spawn(guid).unwrap());
    assert!(!world.content().creatures.contains(&guid));
    assert!(world
        .spatial_index()
        .cell_guids(EASTERN_KINGDOMS, 0, cell)
        .is_none());
    assert_eq!(world_db.row_count("creature"), 5);
    assert!(!world.delete_creature_spawn(guid).unwrap());
}

#[test]
fn test_add_and_delete_gameobject_spawn() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let position = SpawnPosition {
        map: EASTERN_KINGDOMS,
        x: 800.0,
        y: 800.0,
        ..SpawnPosition::default()
    };

    let guid = world
        .add_gameobject_spawn(1731, position, [0.0, 0.0, 0.0, 1.0], 1, 600)
        .unwrap();
    assert_eq!(guid, 6);
    assert!(world.content().gameobjects.contains(&guid));

    assert!(world.delete_gameobject_spawn(guid).unwrap());
    assert_eq!(world_db.row_count("gameobject"), 1);
}

#[test]
fn test_add_spawn_rejections() {
    let (world_db, character_db) = (world_db(), character_db());
    let mut world = open(&world_db, &character_db);
    let morass = SpawnPosition {
        map: BLACK_MORASS,
        ..SpawnPosition::default()
    };

    assert!(matches!(
        world.add_creature_spawn(20531, morass, 3, 0),
        Err(SpawnError::HeroicVariant(20531))
    ));
    assert!(matches!(
        world.add_creature_spawn(4242, morass, 1, 0),
        Err(SpawnError::UnknownTemplate(4242))
    ));
    let nowhere = SpawnPosition {
        map: 9,
        ..SpawnPosition::default()
    };
    assert!(matches!(
        world.add_creature_spawn(299, nowhere, 1, 0),
        Err(SpawnError::UnknownMap(9))
    ));
    let kingdoms = SpawnPosition::default();
    assert!(matches!(
        world.add_creature_spawn(299, kingdoms, 2, 0),
        Err(SpawnError::InvalidSpawnMask { map: 0, mask: 2 })
    ));
    assert_eq!(world.content().creatures.len(), 3);
}

#[test]
fn test_respawn_times_through_world() {
    let (world_db, character_db) = (world_db(), character_db());
    let world = open(&world_db, &character_db);

    world.save_creature_respawn_time(12, BLACK_MORASS, 3, 9000).unwrap();
    world.save_gameobject_respawn_time(5, BLACK_MORASS, 3, 9100).unwrap();
    world.save_creature_respawn_time(10, EASTERN_KINGDOMS, 0, 0).unwrap();

    assert_eq!(world.get_creature_respawn_time(10, 0), 0);
    assert_eq!(world.delete_respawn_times_for_instance(3).unwrap(), 2);
    assert_eq!(world.get_gameobject_respawn_time(5, 3), 0);
    assert_eq!(character_db.row_count(CREATURE_RESPAWN_TABLE), 0);
}

#[test]
fn test_localized_names_fall_back_to_template() {
    let (world_db, character_db) = (world_db(), character_db());
    let world = open(&world_db, &character_db);
    let content = world.content();

    assert_eq!(
        content.creature_name(299, Locale::DeDe),
        Some("Räudiger junger Wolf")
    );
    assert_eq!(
        content.creature_name(299, Locale::FrFr),
        Some("Diseased Young Wolf")
    );
    assert_eq!(content.creature_name(17881, Locale::DeDe), Some("Aeonus"));
    assert_eq!(content.creature_name(1, Locale::DeDe), None);
}

#[test]
fn test_missing_level_one_stats_abort_open() {
    let world_db = world_db();
    world_db.insert_rows("player_levelstats", vec![row![1, 1, 2, 24, 21, 23, 20, 20]]);

    let err = World::open(
        world_db,
        character_db(),
        &ContentSettings::default(),
        &GuidSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ContentError::MissingBaseline { .. }));
}

#[test]
fn test_missing_creature_faction_aborts_open() {
    let world_db = world_db();
    world_db.push_row(
        "creature_template",
        creature_template(3000, 0, "Stray", 999, ""),
    );

    let err = World::open(
        world_db,
        character_db(),
        &ContentSettings::default(),
        &GuidSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ContentError::Integrity { entry: 3000, .. }));
}

#[test]
fn test_world_from_table_directory() {
    let dir = tempfile::tempdir().unwrap();
    let world_dir = dir.path().join("world");
    std::fs::create_dir_all(&world_dir).unwrap();
    std::fs::write(
        world_dir.join("player_levelstats.json"),
        "[[1, 1, 1, 23, 20, 22, 20, 20]]",
    )
    .unwrap();
    std::fs::write(
        world_dir.join("map_template.json"),
        r#"[[0, "Eastern Kingdoms", 0, false]]"#,
    )
    .unwrap();
    std::fs::write(
        world_dir.join("gameobject_template.json"),
        r#"[[1731, 3, 310, "Copper Vein", 0, 0, 1.0, 43, 0, 0, 0, 0, 0, 0, 0, ""]]"#,
    )
    .unwrap();

    let world_db = Arc::new(MemoryDatabase::open_dir(&world_dir).unwrap());
    let character_db = Arc::new(MemoryDatabase::open_dir(dir.path().join("characters")).unwrap());
    let mut world = World::open(
        world_db,
        character_db,
        &ContentSettings::default(),
        &GuidSettings::default(),
    )
    .unwrap();

    let guid = world
        .add_gameobject_spawn(1731, SpawnPosition::default(), [0.0; 4], 1, 0)
        .unwrap();
    assert_eq!(guid, 1);

    // The spawn was written through to disk and survives a fresh open.
    let reopened = MemoryDatabase::open_dir(&world_dir).unwrap();
    assert_eq!(reopened.row_count("gameobject"), 1);
}
