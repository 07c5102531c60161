//! Page texts, NPC texts and gossip menus.

use crate::error::{RowError, StorageError};
use crate::registry::{ContentRecord, ContentRegistry, LoadContext};
use crate::storage::{Database, Row};
use std::collections::BTreeMap;
use tracing::{error, info};

/// `page_text (entry, text, next_page)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub entry: u32,
    pub text: String,
    pub next_page: u32,
}

impl ContentRecord for PageText {
    type Key = u32;
    const TABLE: &'static str = "page_text";
    const NAME: &'static str = "page texts";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        Ok(Self {
            entry: row.u32(0)?,
            text: row.string(1)?,
            next_page: row.u32(2)?,
        })
    }
}

/// `npc_text (id, male_text, female_text, language, probability)`
#[derive(Debug, Clone, PartialEq)]
pub struct NpcText {
    pub id: u32,
    pub male_text: String,
    pub female_text: String,
    pub language: u32,
    pub probability: f32,
}

impl ContentRecord for NpcText {
    type Key = u32;
    const TABLE: &'static str = "npc_text";
    const NAME: &'static str = "npc texts";

    fn key(&self) -> u32 {
        self.id
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let id = row.u32(0)?;
        if id == 0 {
            return Err(RowError::Invalid("npc_text id 0 is reserved".into()));
        }
        let male_text = row.string(1)?;
        let female_text = row.string(2)?;
        if male_text.is_empty() && female_text.is_empty() {
            error!("NPC text {} has no text", id);
        }
        Ok(Self {
            id,
            male_text,
            female_text,
            language: row.u32(3)?,
            probability: row.f32(4)?.clamp(0.0, 1.0),
        })
    }
}

/// All texts of one gossip menu, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipMenu {
    pub entry: u32,
    pub text_ids: Vec<u32>,
}

impl ContentRecord for GossipMenu {
    type Key = u32;
    const TABLE: &'static str = "gossip_menu";
    const NAME: &'static str = "gossip menus";

    fn key(&self) -> u32 {
        self.entry
    }

    /// Single-row view; [`load_gossip_menus`] aggregates the rows of a menu.
    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        Ok(Self {
            entry: row.u32(0)?,
            text_ids: vec![row.u32(1)?],
        })
    }
}

/// Loads `gossip_menu (entry, text_id)`, grouping every row of a menu.
/// Rows naming an unknown NPC text are skipped.
pub fn load_gossip_menus(
    registry: &mut ContentRegistry<GossipMenu>,
    db: &dyn Database,
    reload: bool,
    npc_texts: &ContentRegistry<NpcText>,
) -> Result<usize, StorageError> {
    if reload {
        registry.clear();
    }

    let Some(result) = db.query(GossipMenu::TABLE)? else {
        info!(">> Loaded 0 gossip menus. DB table `gossip_menu` is empty.");
        return Ok(0);
    };

    let mut menus: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for row in result.rows() {
        let (entry, text_id) = match (row.u32(0), row.u32(1)) {
            (Ok(entry), Ok(text_id)) => (entry, text_id),
            (Err(e), _) | (_, Err(e)) => {
                error!("Table `gossip_menu` row skipped: {}", e);
                continue;
            }
        };
        if !npc_texts.contains(&text_id) {
            error!(
                "Gossip menu entry {} uses non-existing text_id {}, skipped",
                entry, text_id
            );
            continue;
        }
        menus.entry(entry).or_default().push(text_id);
    }

    for (entry, text_ids) in menus {
        registry.insert(GossipMenu { entry, text_ids });
    }

    info!(">> Loaded {} gossip menus", registry.len());
    Ok(registry.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentSettings;
    use crate::row;
    use crate::script_names::ScriptNameRegistry;
    use crate::storage::MemoryDatabase;

    #[test]
    fn test_gossip_rows_are_grouped_per_menu() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            "npc_text",
            vec![row![1, "Greetings", "", 0, 1.0_f32], row![2, "Hello", "", 0, 1.0_f32]],
        );
        db.insert_rows(
            "gossip_menu",
            vec![row![100, 1], row![100, 2], row![200, 9], row![300, 2]],
        );

        let scripts = ScriptNameRegistry::default();
        let settings = ContentSettings::default();
        let ctx = LoadContext {
            scripts: &scripts,
            settings: &settings,
        };
        let mut texts = ContentRegistry::<NpcText>::new();
        texts.load(&db, false, &ctx).unwrap();

        let mut menus = ContentRegistry::new();
        assert_eq!(load_gossip_menus(&mut menus, &db, false, &texts).unwrap(), 2);
        assert_eq!(menus.get(&100).unwrap().text_ids, vec![1, 2]);
        assert!(menus.get(&200).is_none());
        assert_eq!(menus.get(&300).unwrap().text_ids, vec![2]);
    }
}
