use crate::error::RowError;
use crate::registry::{ContentRecord, LoadContext};
use crate::storage::Row;
use tracing::error;

pub const QUEST_OBJECTIVES_COUNT: usize = 4;
pub const QUEST_REWARDS_COUNT: usize = 4;

/// Server-side special flag: the quest requires items to be delivered.
pub const QUEST_SPECIAL_FLAG_DELIVER: u32 = 0x080;

/// One row of `quest_template`.
///
/// Columns: `entry, method, zone_or_sort, min_level, quest_level, type,
/// required_races, required_classes, required_min_rep_faction,
/// required_min_rep_value, prev_quest_id, next_quest_id, src_item_id,
/// src_item_count, src_spell, title, details, objectives,
/// req_item_id1..4, req_item_count1..4, rew_item_id1..4, rew_item_count1..4,
/// rew_spell, rew_spell_cast, quest_flags, special_flags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestTemplate {
    pub entry: u32,
    pub method: u32,
    pub zone_or_sort: i32,
    pub min_level: u32,
    pub quest_level: i32,
    pub kind: u32,
    pub required_races: u32,
    pub required_classes: u32,
    pub required_min_rep_faction: u32,
    pub required_min_rep_value: i32,
    /// Negative values mean "must be active", positive "must be rewarded".
    pub prev_quest_id: i32,
    pub next_quest_id: i32,
    pub src_item_id: u32,
    pub src_item_count: u32,
    pub src_spell: u32,
    pub title: String,
    pub details: String,
    pub objectives: String,
    pub req_item_id: [u32; QUEST_OBJECTIVES_COUNT],
    pub req_item_count: [u32; QUEST_OBJECTIVES_COUNT],
    pub rew_item_id: [u32; QUEST_REWARDS_COUNT],
    pub rew_item_count: [u32; QUEST_REWARDS_COUNT],
    pub rew_spell: u32,
    pub rew_spell_cast: u32,
    pub quest_flags: u32,
    pub special_flags: u32,
}

impl QuestTemplate {
    pub fn has_special_flag(&self, flag: u32) -> bool {
        self.special_flags & flag != 0
    }
}

fn four(row: &Row, first: usize) -> Result<[u32; 4], RowError> {
    Ok([
        row.u32(first)?,
        row.u32(first + 1)?,
        row.u32(first + 2)?,
        row.u32(first + 3)?,
    ])
}

impl ContentRecord for QuestTemplate {
    type Key = u32;
    const TABLE: &'static str = "quest_template";
    const NAME: &'static str = "quests definitions";

    fn key(&self) -> u32 {
        self.entry
    }

    fn from_row(row: &Row, _ctx: &LoadContext<'_>) -> Result<Self, RowError> {
        let entry = row.u32(0)?;

        let mut method = row.u32(1)?;
        if method > 2 {
            error!(
                "Quest {} has `Method` = {}, expected values are 0, 1 or 2; set to 2",
                entry, method
            );
            method = 2;
        }

        Ok(Self {
            entry,
            method,
            zone_or_sort: row.i32(2)?,
            min_level: row.u32(3)?,
            quest_level: row.i32(4)?,
            kind: row.u32(5)?,
            required_races: row.u32(6)?,
            required_classes: row.u32(7)?,
            required_min_rep_faction: row.u32(8)?,
            required_min_rep_value: row.i32(9)?,
            prev_quest_id: row.i32(10)?,
            next_quest_id: row.i32(11)?,
            src_item_id: row.u32(12)?,
            src_item_count: row.u32(13)?,
            src_spell: row.u32(14)?,
            title: row.string(15)?,
            details: row.string(16)?,
            objectives: row.string(17)?,
            req_item_id: four(row, 18)?,
            req_item_count: four(row, 22)?,
            rew_item_id: four(row, 26)?,
            rew_item_count: four(row, 30)?,
            rew_spell: row.u32(34)?,
            rew_spell_cast: row.u32(35)?,
            quest_flags: row.u32(36)?,
            special_flags: row.u32(37)?,
        })
    }
}
