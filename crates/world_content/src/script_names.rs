//! Dense script ids for script names.
//!
//! Script names are collected once from every script-bearing table, sorted
//! and deduplicated. The id of a name is its index; index 0 is the empty
//! name and means "no script".

use crate::error::StorageError;
use crate::storage::Database;
use tracing::info;

/// `(table, column)` pairs that hold a script name.
pub const SCRIPT_NAME_COLUMNS: [(&str, usize); 4] = [
    ("creature_template", 19),
    ("gameobject_template", 15),
    ("item_template", 25),
    ("areatrigger_scripts", 1),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptNameRegistry {
    names: Vec<String>,
}

impl Default for ScriptNameRegistry {
    fn default() -> Self {
        Self {
            names: vec![String::new()],
        }
    }
}

impl ScriptNameRegistry {
    /// Builds the registry from arbitrary names; empty names are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.is_empty())
            .collect();
        collected.push(String::new());
        collected.sort_unstable();
        collected.dedup();
        Self { names: collected }
    }

    /// Unions the script-name columns of every script-bearing table.
    pub fn load(db: &dyn Database) -> Result<Self, StorageError> {
        let mut names = Vec::new();
        for (table, column) in SCRIPT_NAME_COLUMNS {
            let Some(result) = db.query(table)? else {
                continue;
            };
            names.extend(
                result
                    .rows()
                    .filter_map(|row| row.string(column).ok())
                    .map(|name| name.trim().to_string()),
            );
        }

        let registry = Self::from_names(names);
        info!(">> Loaded {} script names", registry.len());
        Ok(registry)
    }

    /// Id of `name`, 0 if unknown or empty. Never inserts.
    pub fn get_script_id(&self, name: &str) -> u32 {
        if name.is_empty() {
            return 0;
        }
        match self.names.binary_search_by(|candidate| candidate.as_str().cmp(name)) {
            Ok(index) => index as u32,
            Err(_) => 0,
        }
    }

    /// Name of `id`; `None` for 0 and out-of-range ids.
    pub fn get_script_name(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.names.get(id as usize).map(String::as_str)
    }

    /// Number of real script names, excluding the reserved slot.
    pub fn len(&self) -> usize {
        self.names.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::{Field, MemoryDatabase, Row};

    #[test]
    fn test_ids_are_dense_and_sorted() {
        let registry =
            ScriptNameRegistry::from_names(["npc_guard", "boss_anastari", "", "npc_guard"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_script_id("boss_anastari"), 1);
        assert_eq!(registry.get_script_id("npc_guard"), 2);
        assert_eq!(registry.get_script_name(1), Some("boss_anastari"));
        assert_eq!(registry.get_script_name(2), Some("npc_guard"));
    }

    #[test]
    fn test_unknown_and_empty_names_map_to_zero() {
        let registry = ScriptNameRegistry::from_names(["go_bell"]);
        assert_eq!(registry.get_script_id(""), 0);
        assert_eq!(registry.get_script_id("go_missing"), 0);
        assert_eq!(registry.get_script_name(0), None);
        assert_eq!(registry.get_script_name(7), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_unions_all_script_columns() {
        let db = MemoryDatabase::new();
        let mut creature: Vec<Field> = (0..19_i32).map(Field::from).collect();
        creature.push(Field::from("npc_a"));
        db.insert_rows("creature_template", vec![Row::new(creature)]);
        db.insert_rows("areatrigger_scripts", vec![row![45, "at_b"], row![46, "npc_a"]]);

        let registry = ScriptNameRegistry::load(&db).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_script_id("at_b"), 1);
        assert_eq!(registry.get_script_id("npc_a"), 2);
    }
}
