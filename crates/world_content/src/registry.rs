//! Generic keyed content registry.
//!
//! One [`ContentRegistry`] exists per content table. Rows are decoded with
//! [`ContentRecord::from_row`]; malformed rows are logged and skipped, a
//! repeated key replaces the earlier value and is logged as an error.

use crate::config::ContentSettings;
use crate::error::{RowError, StorageError};
use crate::script_names::ScriptNameRegistry;
use crate::storage::{Database, Row};
use std::collections::hash_map::{self, HashMap};
use std::hash::Hash;
use tracing::{error, info};

/// Read-only state a loader may consult while decoding rows.
#[derive(Debug, Clone, Copy)]
pub struct LoadContext<'a> {
    pub scripts: &'a ScriptNameRegistry,
    pub settings: &'a ContentSettings,
}

/// A value type stored in a [`ContentRegistry`].
pub trait ContentRecord: Sized {
    type Key: Copy + Eq + Hash + std::fmt::Debug;

    /// Source table.
    const TABLE: &'static str;

    /// Plural noun used in load summaries.
    const NAME: &'static str;

    fn key(&self) -> Self::Key;

    /// Decodes one row, applying inline clamps. An error skips the row.
    fn from_row(row: &Row, ctx: &LoadContext<'_>) -> Result<Self, RowError>;
}

/// Owning map from content key to value.
#[derive(Debug, Clone)]
pub struct ContentRegistry<V: ContentRecord> {
    entries: HashMap<V::Key, V>,
}

impl<V: ContentRecord> Default for ContentRegistry<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: ContentRecord> ContentRegistry<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the registry from `V::TABLE`. With `reload` the previous
    /// generation is dropped first. Returns the number of stored entries.
    pub fn load(
        &mut self,
        db: &dyn Database,
        reload: bool,
        ctx: &LoadContext<'_>,
    ) -> Result<usize, StorageError> {
        if reload {
            self.entries.clear();
        }

        let Some(result) = db.query(V::TABLE)? else {
            info!(">> Loaded 0 {}. DB table `{}` is empty.", V::NAME, V::TABLE);
            return Ok(0);
        };

        for (index, row) in result.rows().enumerate() {
            match V::from_row(row, ctx) {
                Ok(value) => self.insert(value),
                Err(e) => error!("Table `{}` row {} skipped: {}", V::TABLE, index, e),
            }
        }

        info!(">> Loaded {} {}", self.entries.len(), V::NAME);
        Ok(self.entries.len())
    }

    /// Stores `value`, replacing and logging any entry with the same key.
    pub fn insert(&mut self, value: V) {
        let key = value.key();
        if self.entries.insert(key, value).is_some() {
            error!(
                "Table `{}` has duplicate entry {:?}, later row replaces it",
                V::TABLE,
                key
            );
        }
    }

    /// Removes an entry, returning it.
    pub fn remove(&mut self, key: &V::Key) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &V::Key) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &V::Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, V::Key, V> {
        self.entries.iter()
    }

    pub fn values_mut(&mut self) -> hash_map::ValuesMut<'_, V::Key, V> {
        self.entries.values_mut()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, V::Key, V> {
        self.entries.keys()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
