use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;
use tracing::error;

pub const MAX_ITEM_CLASS: u8 = 16;
pub const ITEM_CLASS_JUNK: u8 = 15;
pub const MAX_ITEM_QUALITY: u8 = 7;
pub const ITEM_QUALITY_NORMAL: u8 = 1;
pub const MAX_INVENTORY_TYPE: u8 = 29;
pub const MAX_REPUTATION_RANK: u8 = 8;
pub const MAX_ITEM_PROTO_SPELLS: usize = 5;

/// One row of `item_template`.
///
/// Columns: `entry, class, subclass, name, display_id, quality, flags,
/// buy_price, sell_price, inventory_type, item_level, required_level,
/// required_spell, required_reputation_faction, required_reputation_rank,
/// max_count, stackable, spellid_1..spellid_5, page_text, start_quest,
/// description, ScriptName`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTemplate {
    pub entry: u32,
    pub class: u8,
    pub subclass: u8,
    pub name: String,
    pub display_id: u32,
    pub quality: u8,
    pub flags: u32,
    pub buy_price: u32,
    pub sell_price: u32,
    pub inventory_type: u8,
    pub item_level: u32,
    pub required_level: u8,
    pub required_spell: u32,
    pub required_reputation_faction: u32,
    pub required_reputation_rank: u8,
    pub max_count: u32,
    pub stackable: u32,
    pub spells: [u32; MAX_ITEM_PROTO_SPELLS],
    pub page_text: u32,
    pub start_quest: u32,
    pub description: String,
    pub script_id: u32,
}

impl ContentRecord for ItemTemplate {
    type Key = u32;
    const TABLE: &'static str = "item_template";
    const NAME: &'static str = "item prototypes";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let entry = row.u32(0)?;

        let mut class = row.u8(1)?;
        if class >= MAX_ITEM_CLASS {
            error!("Item (Entry: {}) has wrong class value ({})", entry, class);
            class = ITEM_CLASS_JUNK;
        }

        let mut quality = row.u8(5)?;
        if quality >= MAX_ITEM_QUALITY {
            error!("Item (Entry: {}) has wrong quality value ({})", entry, quality);
            quality = ITEM_QUALITY_NORMAL;
        }

        let mut inventory_type = row.u8(9)?;
        if inventory_type >= MAX_INVENTORY_TYPE {
            error!(
                "Item (Entry: {}) has wrong inventory type value ({})",
                entry, inventory_type
            );
            inventory_type = 0;
        }

        let mut required_reputation_rank = row.u8(14)?;
        if required_reputation_rank >= MAX_REPUTATION_RANK {
            error!(
                "Item (Entry: {}) has wrong reputation rank in required_reputation_rank ({}), item can't be used",
                entry, required_reputation_rank
            );
            required_reputation_rank = 0;
        }

        let mut stackable = row.u32(16)?;
        if stackable == 0 {
            error!("Item (Entry: {}) has stackable 0, set to 1", entry);
            stackable = 1;
        }

        Ok(Self {
            entry,
            class,
            subclass: row.u8(2)?,
            name: row.string(3)?,
            display_id: row.u32(4)?,
            quality,
            flags: row.u32(6)?,
            buy_price: row.u32(7)?,
            sell_price: row.u32(8)?,
            inventory_type,
            item_level: row.u32(10)?,
            required_level: row.u8(11)?,
            required_spell: row.u32(12)?,
            required_reputation_faction: row.u32(13)?,
            required_reputation_rank,
            max_count: row.u32(15)?,
            stackable,
            spells: [
                row.u32(17)?,
                row.u32(18)?,
                row.u32(19)?,
                row.u32(20)?,
                row.u32(21)?,
            ],
            page_text: row.u32(22)?,
            start_quest: row.u32(23)?,
            description: row.string(24)?,
            script_id: ctx.scripts.get_script_id(&row.string(25)?),
        })
    }
}
