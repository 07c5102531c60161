//! In-memory row store, optionally backed by a directory of JSON table files.
//!
//! Each table lives in `<dir>/<table>.json` as an array of positional rows:
//!
//! ```json
//! [
//!   [299, 0, 0, "Diseased Young Wolf", "", 0, 1, 1, 32, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, ""],
//!   [ ... ]
//! ]
//! ```
//!
//! A missing file is an empty table. When the store was opened from a
//! directory, every executed [`Statement`] rewrites the affected table file.
//! Rewrites of one table are serialised and go through a temporary file that
//! is renamed into place, so a reader never sees a partial file.

use super::{Database, Field, ResultSet, Row, Statement};
use crate::error::StorageError;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Thread-safe row store keyed by table name.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: DashMap<String, Vec<Row>>,
    backing_dir: Option<PathBuf>,
    file_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MemoryDatabase {
    /// Creates an empty store with no backing directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.json` table file in `dir` and keeps the directory as
    /// write-through target. A missing directory is created and yields an
    /// empty store.
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        let db = Self {
            backing_dir: Some(dir.to_path_buf()),
            ..Self::default()
        };

        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            info!("Created empty table directory: {}", dir.display());
            return Ok(db);
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(table) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let rows = read_table_file(&path, table)?;
            debug!("Read {} rows from {}", rows.len(), path.display());
            db.tables.insert(table.to_string(), rows);
        }

        info!(
            "Opened table directory {} ({} tables)",
            dir.display(),
            db.tables.len()
        );
        Ok(db)
    }

    /// Replaces the contents of a table.
    pub fn insert_rows(&self, table: &str, rows: Vec<Row>) {
        self.tables.insert(table.to_string(), rows);
    }

    /// Appends a single row to a table.
    pub fn push_row(&self, table: &str, row: Row) {
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|rows| rows.len()).unwrap_or(0)
    }

    /// Snapshot of a table's rows.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .get(table)
            .map(|rows| rows.value().clone())
            .unwrap_or_default()
    }

    fn write_back(&self, table: &str) -> Result<(), StorageError> {
        let Some(dir) = &self.backing_dir else {
            return Ok(());
        };

        let lock = Arc::clone(
            self.file_locks
                .entry(table.to_string())
                .or_default()
                .value(),
        );
        // Held over snapshot and rename so the last writer persists the
        // latest rows.
        let _guard = lock.lock();

        let rows = self.rows(table);
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| row.0.iter().map(field_to_value).collect())
            .collect();

        let path = dir.join(format!("{table}.json"));
        let content = serde_json::to_string_pretty(&values).map_err(|source| {
            StorageError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        let staging = dir.join(format!("{table}.json.tmp"));
        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }
}

impl Database for MemoryDatabase {
    fn query(&self, table: &str) -> Result<Option<ResultSet>, StorageError> {
        Ok(ResultSet::from_rows(self.rows(table)))
    }

    fn max_u32(&self, table: &str, column: usize) -> Result<Option<u32>, StorageError> {
        let Some(rows) = self.tables.get(table) else {
            return Ok(None);
        };

        Ok(rows
            .iter()
            .filter_map(|row| row.0.get(column))
            .map(|field| field.as_i64() as u32)
            .max())
    }

    fn execute(&self, statement: Statement) -> Result<(), StorageError> {
        let table = statement.table();

        // Entry guard is dropped before the file write.
        {
            let mut rows = self.tables.entry(table.to_string()).or_default();
            match statement {
                Statement::Replace {
                    key_columns, row, ..
                } => {
                    let key: Vec<Field> = row.0[..key_columns.min(row.len())].to_vec();
                    rows.retain(|existing| {
                        existing.0.len() < key.len() || existing.0[..key.len()] != key[..]
                    });
                    rows.push(row);
                }
                Statement::Delete { filter, .. } => {
                    rows.retain(|existing| {
                        !filter.iter().all(|(column, value)| {
                            existing.0.get(*column).map(|f| f == value).unwrap_or(false)
                        })
                    });
                }
            }
        }

        self.write_back(table)
    }
}

fn read_table_file(path: &Path, table: &str) -> Result<Vec<Row>, StorageError> {
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<Vec<Value>> =
        serde_json::from_str(&content).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    raw.into_iter()
        .map(|values| {
            values
                .into_iter()
                .map(|value| value_to_field(value, table))
                .collect::<Result<Vec<_>, _>>()
                .map(Row::new)
        })
        .collect()
}

fn value_to_field(value: Value, table: &str) -> Result<Field, StorageError> {
    match value {
        Value::Null => Ok(Field::Null),
        Value::Bool(b) => Ok(Field::from(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Field::Int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Field::Int(u as i64))
            } else {
                Ok(Field::Float(n.as_f64().unwrap_or(0.0)))
            }
        }
        Value::String(s) => Ok(Field::Text(s)),
        other => Err(StorageError::MalformedRow {
            table: table.to_string(),
            detail: format!("unsupported value {other}"),
        }),
    }
}

fn field_to_value(field: &Field) -> Value {
    match field {
        Field::Null => Value::Null,
        Field::Int(v) => Value::from(*v),
        Field::Float(v) => Value::from(*v),
        Field::Text(s) => Value::from(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use tempfile::TempDir;

    #[test]
    fn test_empty_table_is_none() {
        let db = MemoryDatabase::new();
        assert!(db.query("creature_template").unwrap().is_none());
        assert_eq!(db.max_u32("creature", 0).unwrap(), None);
    }

    #[test]
    fn test_max_u32_reads_column() {
        let db = MemoryDatabase::new();
        db.insert_rows("creature", vec![row![5, 100], row![42, 7], row![17, 3]]);

        assert_eq!(db.max_u32("creature", 0).unwrap(), Some(42));
        assert_eq!(db.max_u32("creature", 1).unwrap(), Some(100));
    }

    #[test]
    fn test_replace_overwrites_matching_key_prefix() {
        let db = MemoryDatabase::new();
        db.execute(Statement::Replace {
            table: "creature_respawn",
            key_columns: 2,
            row: row![5, 1, 100, 0],
        })
        .unwrap();
        db.execute(Statement::Replace {
            table: "creature_respawn",
            key_columns: 2,
            row: row![5, 1, 200, 0],
        })
        .unwrap();
        db.execute(Statement::Replace {
            table: "creature_respawn",
            key_columns: 2,
            row: row![5, 2, 300, 0],
        })
        .unwrap();

        let rows = db.rows("creature_respawn");
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&row![5, 1, 200, 0]));
        assert!(rows.contains(&row![5, 2, 300, 0]));
    }

    #[test]
    fn test_delete_filters_on_all_columns() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            "gameobject_respawn",
            vec![row![1, 10, 5, 0], row![2, 10, 5, 0], row![3, 11, 5, 0]],
        );

        db.execute(Statement::Delete {
            table: "gameobject_respawn",
            filter: vec![(1, Field::from(10))],
        })
        .unwrap();

        assert_eq!(db.rows("gameobject_respawn"), vec![row![3, 11, 5, 0]]);
    }

    #[test]
    fn test_open_dir_reads_tables_and_writes_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("spell_template.json"),
            r#"[[133, 2, "Fireball"], [116, 4, "Frostbolt"]]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let db = MemoryDatabase::open_dir(dir.path()).unwrap();
        let result = db.query("spell_template").unwrap().unwrap();
        assert_eq!(result.len(), 2);
        let first = result.rows().next().unwrap();
        assert_eq!(first.string(2).unwrap(), "Fireball");

        db.execute(Statement::Replace {
            table: "creature_respawn",
            key_columns: 2,
            row: row![9, 0, 12345, 1],
        })
        .unwrap();

        let reopened = MemoryDatabase::open_dir(dir.path()).unwrap();
        assert_eq!(reopened.rows("creature_respawn"), vec![row![9, 0, 12345, 1]]);
    }

    #[test]
    fn test_concurrent_statements_leave_a_readable_file() {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(MemoryDatabase::open_dir(dir.path()).unwrap());

        let handles: Vec<_> = (0..16u32)
            .map(|thread| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    for guid in 0..25u32 {
                        db.execute(Statement::Replace {
                            table: "creature_respawn",
                            key_columns: 2,
                            row: row![thread * 100 + guid, 0, 5000 + guid, 1],
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = MemoryDatabase::open_dir(dir.path()).unwrap();
        assert_eq!(reopened.row_count("creature_respawn"), 16 * 25);
        assert!(!dir.path().join("creature_respawn.json.tmp").exists());
    }

    #[test]
    fn test_open_dir_rejects_nested_values() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("page_text.json"), r#"[[1, {"a": 1}]]"#).unwrap();

        let err = MemoryDatabase::open_dir(dir.path()).unwrap_err();
        assert!(matches!(err, StorageError::MalformedRow { .. }));
    }
}
