//! Startup load stages and their ordering constraints.

use crate::error::ContentError;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStage {
    ScriptNames,
    Spells,
    Factions,
    Maps,
    PageTexts,
    NpcTexts,
    GossipMenus,
    CreatureTemplates,
    ItemTemplates,
    GameObjectTemplates,
    QuestTemplates,
    AreaTriggerScripts,
    PlayerLevelStats,
    WardenData,
    Locales,
    CreatureSpawns,
    GameObjectSpawns,
    Validation,
}

impl LoadStage {
    /// Stages that must have completed before this one starts.
    pub fn dependencies(self) -> &'static [LoadStage] {
        use LoadStage::*;
        match self {
            ScriptNames | Spells | Factions | Maps | PageTexts | NpcTexts | QuestTemplates
            | PlayerLevelStats | WardenData => &[],
            GossipMenus => &[NpcTexts],
            CreatureTemplates | ItemTemplates | GameObjectTemplates | AreaTriggerScripts => {
                &[ScriptNames]
            }
            Locales => &[
                CreatureTemplates,
                ItemTemplates,
                GameObjectTemplates,
                QuestTemplates,
                PageTexts,
            ],
            CreatureSpawns => &[CreatureTemplates, Maps, ScriptNames],
            GameObjectSpawns => &[GameObjectTemplates, Maps, ScriptNames],
            Validation => &[
                Spells,
                Factions,
                PageTexts,
                GossipMenus,
                CreatureTemplates,
                ItemTemplates,
                GameObjectTemplates,
                QuestTemplates,
            ],
        }
    }
}

/// The order the content store runs its stages in.
pub const LOAD_ORDER: [LoadStage; 18] = [
    LoadStage::ScriptNames,
    LoadStage::Spells,
    LoadStage::Factions,
    LoadStage::Maps,
    LoadStage::PageTexts,
    LoadStage::NpcTexts,
    LoadStage::GossipMenus,
    LoadStage::CreatureTemplates,
    LoadStage::ItemTemplates,
    LoadStage::GameObjectTemplates,
    LoadStage::QuestTemplates,
    LoadStage::AreaTriggerScripts,
    LoadStage::PlayerLevelStats,
    LoadStage::WardenData,
    LoadStage::Locales,
    LoadStage::CreatureSpawns,
    LoadStage::GameObjectSpawns,
    LoadStage::Validation,
];

/// Checks that every stage runs once and after all of its dependencies.
pub fn validate_order(order: &[LoadStage]) -> Result<(), ContentError> {
    let mut done = HashSet::new();
    for &stage in order {
        if let Some(missing) = stage
            .dependencies()
            .iter()
            .find(|dependency| !done.contains(*dependency))
        {
            return Err(ContentError::LoadOrder(format!(
                "{stage:?} scheduled before {missing:?}"
            )));
        }
        if !done.insert(stage) {
            return Err(ContentError::LoadOrder(format!("{stage:?} scheduled twice")));
        }
    }

    if let Some(skipped) = LOAD_ORDER.iter().find(|stage| !done.contains(*stage)) {
        return Err(ContentError::LoadOrder(format!("{skipped:?} never scheduled")));
    }
    Ok(())
}
