//! Every content registry of a world, and the staged load that fills them.

use crate::config::ContentSettings;
use crate::error::ContentError;
use crate::load_order::{validate_order, LoadStage, LOAD_ORDER};
use crate::locale::Locale;
use crate::localization::{fields, ContentLocales};
use crate::registry::{ContentRegistry, LoadContext};
use crate::script_names::ScriptNameRegistry;
use crate::spatial::SpatialIndex;
use crate::spawns::{load_creature_spawns, load_gameobject_spawns, CreatureData, GameObjectData};
use crate::storage::Database;
use crate::templates::text::load_gossip_menus;
use crate::templates::{
    AreaTriggerScript, CreatureTemplate, FactionTemplateEntry, GameObjectTemplate, GossipMenu,
    ItemTemplate, MapEntry, NpcText, PageText, PlayerLevelStats, QuestTemplate, SpellEntry,
    WardenDataStorage,
};
use crate::validation::{validate, ValidationReport};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ContentStore {
    pub scripts: ScriptNameRegistry,
    pub spells: ContentRegistry<SpellEntry>,
    pub factions: ContentRegistry<FactionTemplateEntry>,
    pub maps: ContentRegistry<MapEntry>,
    pub page_texts: ContentRegistry<PageText>,
    pub npc_texts: ContentRegistry<NpcText>,
    pub gossip_menus: ContentRegistry<GossipMenu>,
    pub creature_templates: ContentRegistry<CreatureTemplate>,
    pub item_templates: ContentRegistry<ItemTemplate>,
    pub gameobject_templates: ContentRegistry<GameObjectTemplate>,
    pub quest_templates: ContentRegistry<QuestTemplate>,
    pub areatrigger_scripts: ContentRegistry<AreaTriggerScript>,
    pub player_stats: PlayerLevelStats,
    pub warden: WardenDataStorage,
    pub locales: ContentLocales,
    pub creatures: ContentRegistry<CreatureData>,
    pub gameobjects: ContentRegistry<GameObjectData>,
    heroic_variants: HashSet<u32>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every stage of [`LOAD_ORDER`] against `db`, registering spawns in
    /// `index`. With `reload` each registry drops its previous generation.
    pub fn load(
        &mut self,
        db: &dyn Database,
        reload: bool,
        settings: &ContentSettings,
        index: &SpatialIndex,
    ) -> Result<ValidationReport, ContentError> {
        validate_order(&LOAD_ORDER)?;

        let started = Instant::now();
        let mut report = ValidationReport::default();
        for stage in LOAD_ORDER {
            let stage_started = Instant::now();
            if let Some(stage_report) = self.load_stage(stage, db, reload, settings, index)? {
                report = stage_report;
            }
            debug!("Stage {:?} done in {:?}", stage, stage_started.elapsed());
        }

        info!(
            ">> Content {} in {} ms",
            if reload { "reloaded" } else { "loaded" },
            started.elapsed().as_millis()
        );
        Ok(report)
    }

    fn load_stage(
        &mut self,
        stage: LoadStage,
        db: &dyn Database,
        reload: bool,
        settings: &ContentSettings,
        index: &SpatialIndex,
    ) -> Result<Option<ValidationReport>, ContentError> {
        let ctx = LoadContext {
            scripts: &self.scripts,
            settings,
        };

        match stage {
            LoadStage::ScriptNames => {
                self.scripts = ScriptNameRegistry::load(db)?;
            }
            LoadStage::Spells => {
                self.spells.load(db, reload, &ctx)?;
            }
            LoadStage::Factions => {
                self.factions.load(db, reload, &ctx)?;
            }
            LoadStage::Maps => {
                self.maps.load(db, reload, &ctx)?;
            }
            LoadStage::PageTexts => {
                self.page_texts.load(db, reload, &ctx)?;
            }
            LoadStage::NpcTexts => {
                self.npc_texts.load(db, reload, &ctx)?;
            }
            LoadStage::GossipMenus => {
                load_gossip_menus(&mut self.gossip_menus, db, reload, &self.npc_texts)?;
            }
            LoadStage::CreatureTemplates => {
                self.creature_templates.load(db, reload, &ctx)?;
                // Self references are cleared by validation, not variants.
                self.heroic_variants = self
                    .creature_templates
                    .iter()
                    .map(|(&entry, template)| (entry, template.heroic_entry))
                    .filter(|&(entry, heroic)| heroic != 0 && heroic != entry)
                    .map(|(_, heroic)| heroic)
                    .collect();
            }
            LoadStage::ItemTemplates => {
                self.item_templates.load(db, reload, &ctx)?;
            }
            LoadStage::GameObjectTemplates => {
                self.gameobject_templates.load(db, reload, &ctx)?;
            }
            LoadStage::QuestTemplates => {
                self.quest_templates.load(db, reload, &ctx)?;
            }
            LoadStage::AreaTriggerScripts => {
                self.areatrigger_scripts.load(db, reload, &ctx)?;
            }
            LoadStage::PlayerLevelStats => {
                self.player_stats = PlayerLevelStats::load(db, settings.max_player_level)?;
            }
            LoadStage::WardenData => {
                self.warden.load(db, reload)?;
            }
            LoadStage::Locales => self.load_locales(db, reload)?,
            LoadStage::CreatureSpawns => {
                load_creature_spawns(
                    &mut self.creatures,
                    db,
                    reload,
                    &ctx,
                    &self.creature_templates,
                    &self.heroic_variants,
                    &self.maps,
                    index,
                )?;
            }
            LoadStage::GameObjectSpawns => {
                load_gameobject_spawns(
                    &mut self.gameobjects,
                    db,
                    reload,
                    &ctx,
                    &self.gameobject_templates,
                    &self.maps,
                    index,
                )?;
            }
            LoadStage::Validation => return validate(self).map(Some),
        }
        Ok(None)
    }

    fn load_locales(&mut self, db: &dyn Database, reload: bool) -> Result<(), ContentError> {
        let locales = &mut self.locales;
        locales
            .creatures
            .load(db, reload, |entry| self.creature_templates.contains(&entry))?;
        locales
            .items
            .load(db, reload, |entry| self.item_templates.contains(&entry))?;
        locales
            .gameobjects
            .load(db, reload, |entry| self.gameobject_templates.contains(&entry))?;
        locales
            .quests
            .load(db, reload, |entry| self.quest_templates.contains(&entry))?;
        locales
            .page_texts
            .load(db, reload, |entry| self.page_texts.contains(&entry))?;
        Ok(())
    }

    /// Whether `entry` is used as another template's heroic variant.
    pub fn is_heroic_variant(&self, entry: u32) -> bool {
        self.heroic_variants.contains(&entry)
    }

    pub fn heroic_variants(&self) -> &HashSet<u32> {
        &self.heroic_variants
    }

    pub fn creature_name(&self, entry: u32, locale: Locale) -> Option<&str> {
        let template = self.creature_templates.get(&entry)?;
        Some(
            self.locales
                .creatures
                .text(entry, fields::CREATURE_NAME, locale, &template.name),
        )
    }

    pub fn creature_title(&self, entry: u32, locale: Locale) -> Option<&str> {
        let template = self.creature_templates.get(&entry)?;
        Some(
            self.locales
                .creatures
                .text(entry, fields::CREATURE_TITLE, locale, &template.subname),
        )
    }

    pub fn item_name(&self, entry: u32, locale: Locale) -> Option<&str> {
        let item = self.item_templates.get(&entry)?;
        Some(
            self.locales
                .items
                .text(entry, fields::ITEM_NAME, locale, &item.name),
        )
    }

    pub fn item_description(&self, entry: u32, locale: Locale) -> Option<&str> {
        let item = self.item_templates.get(&entry)?;
        Some(
            self.locales
                .items
                .text(entry, fields::ITEM_DESCRIPTION, locale, &item.description),
        )
    }

    pub fn gameobject_name(&self, entry: u32, locale: Locale) -> Option<&str> {
        let template = self.gameobject_templates.get(&entry)?;
        Some(
            self.locales
                .gameobjects
                .text(entry, fields::GAMEOBJECT_NAME, locale, &template.name),
        )
    }

    pub fn quest_title(&self, entry: u32, locale: Locale) -> Option<&str> {
        let quest = self.quest_templates.get(&entry)?;
        Some(
            self.locales
                .quests
                .text(entry, fields::QUEST_TITLE, locale, &quest.title),
        )
    }

    pub fn quest_details(&self, entry: u32, locale: Locale) -> Option<&str> {
        let quest = self.quest_templates.get(&entry)?;
        Some(
            self.locales
                .quests
                .text(entry, fields::QUEST_DETAILS, locale, &quest.details),
        )
    }

    pub fn quest_objectives(&self, entry: u32, locale: Locale) -> Option<&str> {
        let quest = self.quest_templates.get(&entry)?;
        Some(
            self.locales
                .quests
                .text(entry, fields::QUEST_OBJECTIVES, locale, &quest.objectives),
        )
    }

    pub fn page_text(&self, entry: u32, locale: Locale) -> Option<&str> {
        let page = self.page_texts.get(&entry)?;
        Some(
            self.locales
                .page_texts
                .text(entry, fields::PAGE_TEXT, locale, &page.text),
        )
    }

    /// Script name bound to a creature template, if any.
    pub fn creature_script_name(&self, entry: u32) -> Option<&str> {
        let template = self.creature_templates.get(&entry)?;
        self.scripts.get_script_name(template.script_id)
    }
}
