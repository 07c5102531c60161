//! Translated text overlays.
//!
//! Each `*_locale` table holds one row per `(entry, locale)`:
//! `entry, locale, field...`. Default-locale rows are ignored since the
//! template itself carries that text. Lookups fall back to the default
//! text whenever a locale has no variant.

use crate::error::StorageError;
use crate::locale::{Locale, LocaleTable, DEFAULT_LOCALE};
use crate::storage::{Database, Row};
use std::collections::HashMap;
use tracing::{error, info};

/// Translations of `N` string fields per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleOverlay<const N: usize> {
    table: &'static str,
    entries: HashMap<u32, [LocaleTable; N]>,
}

impl<const N: usize> LocaleOverlay<N> {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            entries: HashMap::new(),
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Loads the overlay. Rows naming an entry for which `known` is false, or
    /// an unknown locale code, are logged and skipped.
    pub fn load(
        &mut self,
        db: &dyn Database,
        reload: bool,
        known: impl Fn(u32) -> bool,
    ) -> Result<usize, StorageError> {
        if reload {
            self.entries.clear();
        }

        let Some(result) = db.query(self.table)? else {
            info!(">> Loaded 0 locale strings. DB table `{}` is empty.", self.table);
            return Ok(0);
        };

        let mut rows = 0;
        for row in result.rows() {
            match self.apply_row(row, &known) {
                Ok(true) => rows += 1,
                Ok(false) => {}
                Err(detail) => error!("Table `{}` {}, skipped.", self.table, detail),
            }
        }

        info!(
            ">> Loaded {} locale rows for {} entries from `{}`",
            rows,
            self.entries.len(),
            self.table
        );
        Ok(rows)
    }

    fn apply_row(&mut self, row: &Row, known: &impl Fn(u32) -> bool) -> Result<bool, String> {
        let entry = row.u32(0).map_err(|e| e.to_string())?;
        let code = row.string(1).map_err(|e| e.to_string())?;
        let locale = Locale::from_code(&code)
            .ok_or_else(|| format!("has entry {entry} with unknown locale `{code}`"))?;
        if locale == DEFAULT_LOCALE {
            return Ok(false);
        }
        if !known(entry) {
            return Err(format!("has locale strings for non-existing entry {entry}"));
        }

        let mut values = Vec::with_capacity(N);
        for column in 0..N {
            values.push(row.string(2 + column).map_err(|e| e.to_string())?);
        }

        let fields = self
            .entries
            .entry(entry)
            .or_insert_with(|| std::array::from_fn(|_| LocaleTable::new()));
        for (table, value) in fields.iter_mut().zip(values) {
            table.set(locale, value);
        }
        Ok(true)
    }

    /// Translation of `field` for `entry`, if one exists.
    pub fn get(&self, entry: u32, field: usize, locale: Locale) -> Option<&str> {
        if locale == DEFAULT_LOCALE {
            return None;
        }
        self.entries.get(&entry)?.get(field)?.get(locale)
    }

    /// Locale text of `field`, or `default` when no variant is stored.
    pub fn text<'a>(&'a self, entry: u32, field: usize, locale: Locale, default: &'a str) -> &'a str {
        self.get(entry, field, locale).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const CREATURE_LOCALE_TABLE: &str = "creature_template_locale";
pub const ITEM_LOCALE_TABLE: &str = "item_template_locale";
pub const GAMEOBJECT_LOCALE_TABLE: &str = "gameobject_template_locale";
pub const QUEST_LOCALE_TABLE: &str = "quest_template_locale";
pub const PAGE_TEXT_LOCALE_TABLE: &str = "page_text_locale";

/// Field slots of each overlay, in column order.
pub mod fields {
    pub const CREATURE_NAME: usize = 0;
    pub const CREATURE_TITLE: usize = 1;
    pub const ITEM_NAME: usize = 0;
    pub const ITEM_DESCRIPTION: usize = 1;
    pub const GAMEOBJECT_NAME: usize = 0;
    pub const QUEST_TITLE: usize = 0;
    pub const QUEST_DETAILS: usize = 1;
    pub const QUEST_OBJECTIVES: usize = 2;
    pub const PAGE_TEXT: usize = 0;
}

/// Every locale overlay of the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLocales {
    pub creatures: LocaleOverlay<2>,
    pub items: LocaleOverlay<2>,
    pub gameobjects: LocaleOverlay<1>,
    pub quests: LocaleOverlay<3>,
    pub page_texts: LocaleOverlay<1>,
}

impl Default for ContentLocales {
    fn default() -> Self {
        Self {
            creatures: LocaleOverlay::new(CREATURE_LOCALE_TABLE),
            items: LocaleOverlay::new(ITEM_LOCALE_TABLE),
            gameobjects: LocaleOverlay::new(GAMEOBJECT_LOCALE_TABLE),
            quests: LocaleOverlay::new(QUEST_LOCALE_TABLE),
            page_texts: LocaleOverlay::new(PAGE_TEXT_LOCALE_TABLE),
        }
    }
}
