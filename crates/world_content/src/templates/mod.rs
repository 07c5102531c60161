//! Per-table content records.
//!
//! Each record type documents its positional column order next to its
//! definition. Records with a plain one-row-per-key layout implement
//! [`ContentRecord`](crate::registry::ContentRecord); the rest have their
//! own loader.

pub mod areatrigger;
pub mod creature;
pub mod gameobject;
pub mod item;
pub mod player_stats;
pub mod quest;
pub mod reference;
pub mod text;
pub mod warden;

pub use areatrigger::AreaTriggerScript;
pub use creature::{CreatureTemplate, MovementType};
pub use gameobject::GameObjectTemplate;
pub use item::ItemTemplate;
pub use player_stats::PlayerLevelStats;
pub use quest::QuestTemplate;
pub use reference::{FactionTemplateEntry, MapEntry, MapType, SpellEntry};
pub use text::{GossipMenu, NpcText, PageText};
pub use warden::{WardenCheck, WardenCheckType, WardenDataStorage};

#[cfg(test)]
pub(crate) fn decode<V: crate::registry::ContentRecord>(
    row: crate::storage::Row,
) -> Result<V, crate::error::RowError> {
    let scripts = crate::script_names::ScriptNameRegistry::default();
    let settings = crate::config::ContentSettings::default();
    V::from_row(
        &row,
        &crate::registry::LoadContext {
            scripts: &scripts,
            settings: &settings,
        },
    )
}
