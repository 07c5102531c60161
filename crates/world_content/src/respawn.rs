//! Persisted respawn deadlines.
//!
//! Each clock maps `(low guid, instance)` to an absolute unix timestamp. The
//! map mutation happens under the clock's own mutex; the storage write
//! follows after the guard is dropped.

use crate::error::StorageError;
use crate::guid::LowGuid;
use crate::storage::{Database, Field, Row, Statement};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Unix timestamp in seconds. Zero means "no constraint".
pub type Timestamp = i64;

pub const CREATURE_RESPAWN_TABLE: &str = "creature_respawn";
pub const GAMEOBJECT_RESPAWN_TABLE: &str = "gameobject_respawn";

/// One respawn clock backed by a `(guid, instance, respawn_time, map)` table.
pub struct RespawnClock {
    table: &'static str,
    times: Mutex<HashMap<(LowGuid, u32), Timestamp>>,
    store: Arc<dyn Database>,
}

impl std::fmt::Debug for RespawnClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespawnClock")
            .field("table", &self.table)
            .field("entries", &self.len())
            .finish()
    }
}

impl RespawnClock {
    pub fn new(table: &'static str, store: Arc<dyn Database>) -> Self {
        Self {
            table,
            times: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub fn creature(store: Arc<dyn Database>) -> Self {
        Self::new(CREATURE_RESPAWN_TABLE, store)
    }

    pub fn gameobject(store: Arc<dyn Database>) -> Self {
        Self::new(GAMEOBJECT_RESPAWN_TABLE, store)
    }

    /// Replaces the in-memory state with every persisted row.
    pub fn load(&self) -> Result<usize, StorageError> {
        let mut loaded = HashMap::new();
        if let Some(result) = self.store.query(self.table)? {
            for row in result.rows() {
                match (row.u32(0), row.u32(1), row.i64(2)) {
                    (Ok(guid), Ok(instance), Ok(time)) if time > 0 => {
                        loaded.insert((guid, instance), time);
                    }
                    (Ok(_), Ok(_), Ok(_)) => {}
                    (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                        error!("Table `{}` row skipped: {}", self.table, e);
                    }
                }
            }
        }

        let count = loaded.len();
        *self.times.lock() = loaded;
        info!(">> Loaded {} respawn times from `{}`", count, self.table);
        Ok(count)
    }

    /// Deadline for a spawn, 0 if unconstrained.
    pub fn get(&self, guid: LowGuid, instance: u32) -> Timestamp {
        self.times
            .lock()
            .get(&(guid, instance))
            .copied()
            .unwrap_or(0)
    }

    /// Sets or, with `time == 0`, clears the deadline of a spawn.
    pub fn save(
        &self,
        guid: LowGuid,
        map: u32,
        instance: u32,
        time: Timestamp,
    ) -> Result<(), StorageError> {
        {
            let mut times = self.times.lock();
            if time > 0 {
                times.insert((guid, instance), time);
            } else {
                times.remove(&(guid, instance));
            }
        }

        let statement = if time > 0 {
            Statement::Replace {
                table: self.table,
                key_columns: 2,
                row: Row::new(vec![
                    Field::from(guid),
                    Field::from(instance),
                    Field::from(time),
                    Field::from(map),
                ]),
            }
        } else {
            Statement::Delete {
                table: self.table,
                filter: vec![(0, Field::from(guid)), (1, Field::from(instance))],
            }
        };
        self.store.execute(statement)
    }

    /// Forgets every deadline of a torn-down instance.
    pub fn delete_for_instance(&self, instance: u32) -> Result<usize, StorageError> {
        let removed = {
            let mut times = self.times.lock();
            let before = times.len();
            times.retain(|&(_, entry_instance), _| entry_instance != instance);
            before - times.len()
        };

        debug!(
            "Removed {} entries of instance {} from `{}`",
            removed, instance, self.table
        );
        self.store.execute(Statement::Delete {
            table: self.table,
            filter: vec![(1, Field::from(instance))],
        })?;
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.times.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::MemoryDatabase;
    use std::thread;

    fn clock() -> (Arc<MemoryDatabase>, RespawnClock) {
        let db = Arc::new(MemoryDatabase::new());
        let clock = RespawnClock::creature(db.clone());
        (db, clock)
    }

    #[test]
    fn test_save_zero_deletes_entry_and_row() {
        let (db, clock) = clock();
        clock.save(5, 0, 1, 12345).unwrap();
        assert_eq!(clock.get(5, 1), 12345);
        assert_eq!(db.rows(CREATURE_RESPAWN_TABLE), vec![row![5, 1, 12345_i64, 0]]);

        clock.save(5, 0, 1, 0).unwrap();
        assert_eq!(clock.get(5, 1), 0);
        assert_eq!(db.row_count(CREATURE_RESPAWN_TABLE), 0);
    }

    #[test]
    fn test_save_overwrites_same_key() {
        let (db, clock) = clock();
        clock.save(5, 0, 1, 100).unwrap();
        clock.save(5, 0, 1, 200).unwrap();
        clock.save(5, 0, 2, 300).unwrap();

        assert_eq!(clock.get(5, 1), 200);
        assert_eq!(clock.get(5, 2), 300);
        assert_eq!(db.row_count(CREATURE_RESPAWN_TABLE), 2);
    }

    #[test]
    fn test_delete_for_instance() {
        let (db, clock) = clock();
        clock.save(1, 33, 7, 100).unwrap();
        clock.save(2, 33, 7, 100).unwrap();
        clock.save(3, 33, 8, 100).unwrap();

        assert_eq!(clock.delete_for_instance(7).unwrap(), 2);
        assert_eq!(clock.get(1, 7), 0);
        assert_eq!(clock.get(3, 8), 100);
        assert_eq!(db.rows(CREATURE_RESPAWN_TABLE), vec![row![3, 8, 100_i64, 33]]);

        // Safe on an instance with no entries.
        assert_eq!(clock.delete_for_instance(99).unwrap(), 0);
    }

    #[test]
    fn test_load_recovers_persisted_rows() {
        let db = Arc::new(MemoryDatabase::new());
        db.insert_rows(
            GAMEOBJECT_RESPAWN_TABLE,
            vec![row![10, 0, 5000, 0], row![11, 3, 0, 0], row![12]],
        );
        let clock = RespawnClock::gameobject(db);
        assert_eq!(clock.load().unwrap(), 1);
        assert_eq!(clock.get(10, 0), 5000);
        assert_eq!(clock.get(11, 3), 0);
    }

    #[test]
    fn test_concurrent_saves_from_many_threads() {
        let db = Arc::new(MemoryDatabase::new());
        let clock = Arc::new(RespawnClock::creature(db));
        let handles: Vec<_> = (0..4u32)
            .map(|instance| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    for guid in 0..50u32 {
                        clock.save(guid, 0, instance, 1000 + i64::from(guid)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(clock.len(), 200);
        assert_eq!(clock.get(49, 3), 1049);
    }
}
