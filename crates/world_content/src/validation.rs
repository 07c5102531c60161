//! Cross-reference checks between loaded registries.
//!
//! Runs once every referenced registry is loaded. A reference of 0 is
//! "unset" and never a violation. A dangling reference is repaired per
//! field (see [`REFERENCE_POLICIES`]) and every violation is logged once.
//! Repairs only ever write values that pass the same checks, so a second
//! pass over unchanged data repairs nothing.

use crate::content::ContentStore;
use crate::error::ContentError;
use crate::templates::gameobject::{
    GAMEOBJECT_TYPE_GOOBER, GAMEOBJECT_TYPE_SPELLCASTER, GAMEOBJECT_TYPE_TEXT,
};
use crate::templates::quest::QUEST_SPECIAL_FLAG_DELIVER;
use std::collections::HashSet;
use std::fmt;
use tracing::error;

/// What happens to a field that names a missing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairPolicy {
    /// Set the field (and its companion fields) to 0.
    Zero,
    /// Leave the value, display-only.
    LogOnly,
    /// Refuse to start.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePolicy {
    pub table: &'static str,
    pub field: &'static str,
    pub target: &'static str,
    pub policy: RepairPolicy,
}

const fn policy(
    table: &'static str,
    field: &'static str,
    target: &'static str,
    policy: RepairPolicy,
) -> ReferencePolicy {
    ReferencePolicy {
        table,
        field,
        target,
        policy,
    }
}

/// Every checked reference field.
pub const REFERENCE_POLICIES: &[ReferencePolicy] = &[
    policy("creature_template", "faction", "faction_template", RepairPolicy::Abort),
    policy("creature_template", "heroic_entry", "creature_template", RepairPolicy::Zero),
    policy("creature_template", "spell1..4", "spell_template", RepairPolicy::Zero),
    policy("creature_template", "trainer_spell", "spell_template", RepairPolicy::Zero),
    policy("creature_template", "gossip_menu_id", "gossip_menu", RepairPolicy::Zero),
    policy("item_template", "required_spell", "spell_template", RepairPolicy::Zero),
    policy("item_template", "spellid_1..5", "spell_template", RepairPolicy::Zero),
    policy("item_template", "required_reputation_faction", "faction_template", RepairPolicy::Zero),
    policy("item_template", "page_text", "page_text", RepairPolicy::LogOnly),
    policy("item_template", "start_quest", "quest_template", RepairPolicy::Zero),
    policy("gameobject_template", "faction", "faction_template", RepairPolicy::Zero),
    policy("gameobject_template", "data0 (text)", "page_text", RepairPolicy::Zero),
    policy("gameobject_template", "data1 (goober)", "quest_template", RepairPolicy::Zero),
    policy("gameobject_template", "data0 (spellcaster)", "spell_template", RepairPolicy::Zero),
    policy("quest_template", "src_item_id", "item_template", RepairPolicy::Zero),
    policy("quest_template", "src_spell", "spell_template", RepairPolicy::Zero),
    policy("quest_template", "rew_spell", "spell_template", RepairPolicy::Zero),
    policy("quest_template", "rew_spell_cast", "spell_template", RepairPolicy::Zero),
    policy("quest_template", "req_item_id1..4", "item_template", RepairPolicy::Zero),
    policy("quest_template", "rew_item_id1..4", "item_template", RepairPolicy::Zero),
    policy("quest_template", "required_min_rep_faction", "faction_template", RepairPolicy::Zero),
    policy("quest_template", "prev_quest_id", "quest_template", RepairPolicy::Zero),
    policy("quest_template", "next_quest_id", "quest_template", RepairPolicy::Zero),
    policy("page_text", "next_page", "page_text", RepairPolicy::Zero),
];

/// Listed policy of `table.field`.
pub fn policy_for(table: &str, field: &str) -> Option<&'static ReferencePolicy> {
    REFERENCE_POLICIES
        .iter()
        .find(|p| p.table == table && p.field == field)
}

/// How a violation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// A dangling reference was cleared.
    Zeroed,
    /// A companion field or flag was brought in line.
    Adjusted,
    /// Reported only.
    Logged,
    /// Cannot be repaired; the pass fails once every table is checked.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub table: &'static str,
    pub entry: u32,
    pub field: String,
    pub detail: String,
    pub repair: Repair,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.repair {
            Repair::Zeroed => "set to 0",
            Repair::Adjusted => "adjusted",
            Repair::Logged => "left as is",
            Repair::Rejected => "can't continue",
        };
        write!(
            f,
            "Table `{}` entry {} field `{}` {}, {}",
            self.table, self.entry, self.field, self.detail, action
        )
    }
}

/// Violations found by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    fn record(&mut self, violation: Violation) {
        error!("{}", violation);
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations that changed data.
    pub fn repairs(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| matches!(v.repair, Repair::Zeroed | Repair::Adjusted))
    }

    /// Violations that make the content unusable.
    pub fn rejections(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.repair == Repair::Rejected)
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

struct Checker<'r> {
    table: &'static str,
    report: &'r mut ValidationReport,
}

impl Checker<'_> {
    /// Applies the listed policy for `policy_field` when `value` names a
    /// missing entry. `field` is the concrete column reported. Returns
    /// whether `value` was zeroed. Unlisted fields are zeroed.
    fn reference(
        &mut self,
        entry: u32,
        policy_field: &str,
        field: &str,
        value: &mut u32,
        exists: impl Fn(u32) -> bool,
    ) -> bool {
        if *value == 0 || exists(*value) {
            return false;
        }

        let (target, policy) = match policy_for(self.table, policy_field) {
            Some(listed) => (listed.target, listed.policy),
            None => ("entry", RepairPolicy::Zero),
        };
        let repair = match policy {
            RepairPolicy::Zero => Repair::Zeroed,
            RepairPolicy::LogOnly => Repair::Logged,
            RepairPolicy::Abort => Repair::Rejected,
        };
        self.report.record(Violation {
            table: self.table,
            entry,
            field: field.to_string(),
            detail: format!("references non-existing {} {}", target, *value),
            repair,
        });

        if repair == Repair::Zeroed {
            *value = 0;
            true
        } else {
            false
        }
    }

    fn adjusted(&mut self, entry: u32, field: &str, detail: String) {
        self.report.record(Violation {
            table: self.table,
            entry,
            field: field.to_string(),
            detail,
            repair: Repair::Adjusted,
        });
    }
}

/// Validates every cross reference of `store`, repairing in place.
///
/// All tables are checked before a rejected reference fails the pass, so
/// every violation is logged and every repairable one repaired.
pub fn validate(store: &mut ContentStore) -> Result<ValidationReport, ContentError> {
    let mut report = ValidationReport::default();
    validate_creature_templates(store, &mut report);
    validate_item_templates(store, &mut report);
    validate_gameobject_templates(store, &mut report);
    validate_quest_templates(store, &mut report);
    validate_page_texts(store, &mut report);

    if let Some(rejected) = report.rejections().next() {
        error!(
            "{} content references cannot be repaired, aborting",
            report.rejections().count()
        );
        return Err(ContentError::Integrity {
            table: rejected.table,
            entry: rejected.entry,
            detail: rejected.detail.clone(),
        });
    }
    Ok(report)
}

fn validate_creature_templates(store: &mut ContentStore, report: &mut ValidationReport) {
    let entries: HashSet<u32> = store.creature_templates.keys().copied().collect();
    let spells = &store.spells;
    let factions = &store.factions;
    let gossip_menus = &store.gossip_menus;
    let mut check = Checker {
        table: "creature_template",
        report,
    };

    for template in store.creature_templates.values_mut() {
        let entry = template.entry;

        check.reference(entry, "faction", "faction", &mut template.faction, |id| {
            factions.contains(&id)
        });

        if template.heroic_entry == entry {
            check.adjusted(
                entry,
                "heroic_entry",
                "names the template itself".to_string(),
            );
            template.heroic_entry = 0;
        }
        check.reference(
            entry,
            "heroic_entry",
            "heroic_entry",
            &mut template.heroic_entry,
            |e| entries.contains(&e),
        );

        for (slot, spell) in template.spells.iter_mut().enumerate() {
            check.reference(entry, "spell1..4", &format!("spell{}", slot + 1), spell, |id| {
                spells.contains(&id)
            });
        }
        check.reference(
            entry,
            "trainer_spell",
            "trainer_spell",
            &mut template.trainer_spell,
            |id| spells.contains(&id),
        );
        check.reference(
            entry,
            "gossip_menu_id",
            "gossip_menu_id",
            &mut template.gossip_menu_id,
            |id| gossip_menus.contains(&id),
        );
    }
}

fn validate_item_templates(store: &mut ContentStore, report: &mut ValidationReport) {
    let spells = &store.spells;
    let factions = &store.factions;
    let page_texts = &store.page_texts;
    let quests = &store.quest_templates;
    let mut check = Checker {
        table: "item_template",
        report,
    };

    for item in store.item_templates.values_mut() {
        let entry = item.entry;

        check.reference(
            entry,
            "required_spell",
            "required_spell",
            &mut item.required_spell,
            |id| spells.contains(&id),
        );
        for (slot, spell) in item.spells.iter_mut().enumerate() {
            check.reference(
                entry,
                "spellid_1..5",
                &format!("spellid_{}", slot + 1),
                spell,
                |id| spells.contains(&id),
            );
        }

        if check.reference(
            entry,
            "required_reputation_faction",
            "required_reputation_faction",
            &mut item.required_reputation_faction,
            |id| factions.contains(&id),
        ) {
            item.required_reputation_rank = 0;
        } else if item.required_reputation_faction == 0 && item.required_reputation_rank != 0 {
            check.adjusted(
                entry,
                "required_reputation_rank",
                format!(
                    "is {} without required_reputation_faction",
                    item.required_reputation_rank
                ),
            );
            item.required_reputation_rank = 0;
        }

        check.reference(entry, "page_text", "page_text", &mut item.page_text, |id| {
            page_texts.contains(&id)
        });
        check.reference(
            entry,
            "start_quest",
            "start_quest",
            &mut item.start_quest,
            |id| quests.contains(&id),
        );
    }
}

fn validate_gameobject_templates(store: &mut ContentStore, report: &mut ValidationReport) {
    let spells = &store.spells;
    let factions = &store.factions;
    let page_texts = &store.page_texts;
    let quests = &store.quest_templates;
    let mut check = Checker {
        table: "gameobject_template",
        report,
    };

    for template in store.gameobject_templates.values_mut() {
        let entry = template.entry;

        check.reference(entry, "faction", "faction", &mut template.faction, |id| {
            factions.contains(&id)
        });

        match template.kind {
            GAMEOBJECT_TYPE_TEXT => {
                check.reference(entry, "data0 (text)", "data0", &mut template.data[0], |id| {
                    page_texts.contains(&id)
                });
            }
            GAMEOBJECT_TYPE_GOOBER => {
                check.reference(entry, "data1 (goober)", "data1", &mut template.data[1], |id| {
                    quests.contains(&id)
                });
            }
            GAMEOBJECT_TYPE_SPELLCASTER => {
                check.reference(
                    entry,
                    "data0 (spellcaster)",
                    "data0",
                    &mut template.data[0],
                    |id| spells.contains(&id),
                );
            }
            _ => {}
        }
    }
}

fn validate_quest_templates(store: &mut ContentStore, report: &mut ValidationReport) {
    let spells = &store.spells;
    let factions = &store.factions;
    let items = &store.item_templates;
    let quest_ids: HashSet<u32> = store.quest_templates.keys().copied().collect();
    let mut check = Checker {
        table: "quest_template",
        report,
    };

    for quest in store.quest_templates.values_mut() {
        let entry = quest.entry;

        if check.reference(
            entry,
            "src_item_id",
            "src_item_id",
            &mut quest.src_item_id,
            |id| items.contains(&id),
        ) {
            quest.src_item_count = 0;
        } else if quest.src_item_id != 0 && quest.src_item_count == 0 {
            check.adjusted(entry, "src_item_count", "is 0 with src_item_id set".into());
            quest.src_item_count = 1;
        } else if quest.src_item_id == 0 && quest.src_item_count != 0 {
            check.adjusted(
                entry,
                "src_item_count",
                format!("is {} without src_item_id", quest.src_item_count),
            );
            quest.src_item_count = 0;
        }

        for (field, spell) in [
            ("src_spell", &mut quest.src_spell),
            ("rew_spell", &mut quest.rew_spell),
            ("rew_spell_cast", &mut quest.rew_spell_cast),
        ] {
            check.reference(entry, field, field, spell, |id| spells.contains(&id));
        }

        for slot in 0..quest.req_item_id.len() {
            let field = format!("req_item_id{}", slot + 1);
            if check.reference(
                entry,
                "req_item_id1..4",
                &field,
                &mut quest.req_item_id[slot],
                |id| items.contains(&id),
            ) {
                quest.req_item_count[slot] = 0;
            } else if quest.req_item_id[slot] != 0 && quest.req_item_count[slot] == 0 {
                check.adjusted(
                    entry,
                    &format!("req_item_count{}", slot + 1),
                    format!("is 0 with {field} set"),
                );
                quest.req_item_count[slot] = 1;
            }
        }

        let delivers = quest.req_item_id.iter().any(|&id| id != 0);
        if delivers && !quest.has_special_flag(QUEST_SPECIAL_FLAG_DELIVER) {
            check.adjusted(entry, "special_flags", "lacks DELIVER with required items".into());
            quest.special_flags |= QUEST_SPECIAL_FLAG_DELIVER;
        } else if !delivers && quest.has_special_flag(QUEST_SPECIAL_FLAG_DELIVER) {
            check.adjusted(entry, "special_flags", "has DELIVER without required items".into());
            quest.special_flags &= !QUEST_SPECIAL_FLAG_DELIVER;
        }

        for slot in 0..quest.rew_item_id.len() {
            let field = format!("rew_item_id{}", slot + 1);
            if check.reference(
                entry,
                "rew_item_id1..4",
                &field,
                &mut quest.rew_item_id[slot],
                |id| items.contains(&id),
            ) {
                quest.rew_item_count[slot] = 0;
            } else if quest.rew_item_id[slot] != 0 && quest.rew_item_count[slot] == 0 {
                check.adjusted(
                    entry,
                    &format!("rew_item_count{}", slot + 1),
                    format!("is 0 with {field} set"),
                );
                quest.rew_item_count[slot] = 1;
            }
        }

        check.reference(
            entry,
            "required_min_rep_faction",
            "required_min_rep_faction",
            &mut quest.required_min_rep_faction,
            |id| factions.contains(&id),
        );

        for (field, chained) in [
            ("prev_quest_id", &mut quest.prev_quest_id),
            ("next_quest_id", &mut quest.next_quest_id),
        ] {
            let mut target = chained.unsigned_abs();
            if check.reference(entry, field, field, &mut target, |id| quest_ids.contains(&id)) {
                *chained = 0;
            }
        }
    }
}

fn validate_page_texts(store: &mut ContentStore, report: &mut ValidationReport) {
    let pages: HashSet<u32> = store.page_texts.keys().copied().collect();
    let mut check = Checker {
        table: "page_text",
        report,
    };

    for page in store.page_texts.values_mut() {
        check.reference(
            page.entry,
            "next_page",
            "next_page",
            &mut page.next_page,
            |id| pages.contains(&id),
        );
    }
}
