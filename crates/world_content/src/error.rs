//! Error types for content loading, storage access and GUID allocation.
//!
//! Failures are split by how the caller is expected to react:
//!
//! * [`RowError`] - one malformed row; the loader logs it and skips the row
//! * [`StorageError`] - the row source itself failed
//! * [`ContentError`] - a load pass cannot produce a usable world
//! * [`GuidError`] - an identifier class ran out of values

use crate::allocator::IdentifierClass;
use std::path::PathBuf;

/// Errors raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading a backing file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A table file could not be decoded
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A row contained a value that cannot be represented as a field
    #[error("Malformed row in `{table}`: {detail}")]
    MalformedRow { table: String, detail: String },
}

/// Errors raised while extracting a single row.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// The row has fewer columns than the loader expects
    #[error("missing column {index} (row has {len} columns)")]
    MissingColumn { index: usize, len: usize },

    /// A value is outside anything the loader can repair
    #[error("{0}")]
    Invalid(String),
}

/// Errors that make a load pass fail as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Baseline rows without a sane default are absent
    #[error("Missing mandatory data in `{table}`: {detail}")]
    MissingBaseline { table: &'static str, detail: String },

    /// A link whose absence would corrupt client-facing state
    #[error("Integrity violation in `{table}` entry {entry}: {detail}")]
    Integrity {
        table: &'static str,
        entry: u32,
        detail: String,
    },

    /// A stage was scheduled before one of its dependencies
    #[error("Load order violation: {0}")]
    LoadOrder(String),
}

/// Errors raised by the identifier allocator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuidError {
    /// The class cannot hand out another identifier without wrapping
    #[error("{class:?} guid overflow (max {max:#x}), can't continue")]
    Exhausted { class: IdentifierClass, max: u32 },
}

/// Errors raised when placing or removing a spawn at runtime.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("No template with entry {0}")]
    UnknownTemplate(u32),

    /// The template is some other template's heroic variant
    #[error("Template {0} is a heroic-mode variant and cannot be spawned directly")]
    HeroicVariant(u32),

    #[error("No map with id {0}")]
    UnknownMap(u32),

    /// No spawn mode of the map is selected
    #[error("Spawn mask {mask:#x} selects no valid mode of map {map}")]
    InvalidSpawnMask { map: u32, mask: u8 },

    #[error(transparent)]
    Guid(#[from] GuidError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
