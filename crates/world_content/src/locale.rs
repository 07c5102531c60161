//! Client locales and sparse per-locale string tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Client locales understood by the content tables, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Locale {
    EnUs = 0,
    KoKr = 1,
    FrFr = 2,
    DeDe = 3,
    ZhCn = 4,
    ZhTw = 5,
    EsEs = 6,
    EsMx = 7,
    RuRu = 8,
}

/// Number of locale slots a [`LocaleTable`] can hold.
pub const TOTAL_LOCALES: usize = 9;

/// Locale whose text is stored in the template row itself.
pub const DEFAULT_LOCALE: Locale = Locale::EnUs;

impl Locale {
    pub const ALL: [Locale; TOTAL_LOCALES] = [
        Locale::EnUs,
        Locale::KoKr,
        Locale::FrFr,
        Locale::DeDe,
        Locale::ZhCn,
        Locale::ZhTw,
        Locale::EsEs,
        Locale::EsMx,
        Locale::RuRu,
    ];

    /// Parses a client locale code such as `"frFR"`.
    pub fn from_code(code: &str) -> Option<Locale> {
        Locale::ALL.into_iter().find(|l| l.code() == code)
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::EnUs => "enUS",
            Locale::KoKr => "koKR",
            Locale::FrFr => "frFR",
            Locale::DeDe => "deDE",
            Locale::ZhCn => "zhCN",
            Locale::ZhTw => "zhTW",
            Locale::EsEs => "esES",
            Locale::EsMx => "esMX",
            Locale::RuRu => "ruRU",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Sparse, locale-indexed variants of one string field.
///
/// The vector only grows as far as the highest locale that has text, and
/// empty strings are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTable {
    variants: Vec<String>,
}

impl LocaleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `locale`; empty values are ignored.
    pub fn set(&mut self, locale: Locale, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        let index = locale.index();
        if self.variants.len() <= index {
            self.variants.resize(index + 1, String::new());
        }
        self.variants[index] = value;
    }

    /// Text for `locale`, `None` if that locale has no variant.
    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.variants
            .get(locale.index())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.variants.iter().all(String::is_empty)
    }

    /// Number of allocated slots (highest stored locale + 1).
    pub fn slots(&self) -> usize {
        self.variants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_codes_round_trip_index_order() {
        for (index, locale) in Locale::ALL.into_iter().enumerate() {
            assert_eq!(locale.index(), index);
            assert_eq!(Locale::from_code(locale.code()), Some(locale));
        }
        assert_eq!(Locale::from_code("ruRU"), Some(Locale::RuRu));
        assert_eq!(Locale::from_code("ptBR"), None);
    }

    #[test]
    fn test_table_grows_only_to_highest_locale() {
        let mut table = LocaleTable::new();
        assert!(table.is_empty());

        table.set(Locale::FrFr, "Loup");
        assert_eq!(table.slots(), 3);
        assert_eq!(table.get(Locale::FrFr), Some("Loup"));
        assert_eq!(table.get(Locale::KoKr), None);
        assert_eq!(table.get(Locale::EsMx), None);

        table.set(Locale::DeDe, "Wolf");
        assert_eq!(table.slots(), 4);
        assert_eq!(table.get(Locale::FrFr), Some("Loup"));
    }

    #[test]
    fn test_empty_value_is_not_stored() {
        let mut table = LocaleTable::new();
        table.set(Locale::EsEs, "");
        assert_eq!(table.slots(), 0);
        assert!(table.is_empty());
    }
}
