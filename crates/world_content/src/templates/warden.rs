//! Anti-cheat check definitions and expected results.
//!
//! Checks are addressed by an internal id assigned in load order, starting
//! at 1 and restarting on reload. Every row takes an id before it is
//! decoded, so a rejected row leaves a gap.

use crate::error::{RowError, StorageError};
use crate::storage::{Database, Row};
use std::collections::BTreeMap;
use tracing::{error, info};

const TABLE: &str = "warden_data_result";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WardenCheckType {
    Timing,
    Driver,
    Proc,
    LuaStr,
    Mpq,
    PageA,
    PageB,
    Module,
    Mem,
}

impl WardenCheckType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x57 => Some(Self::Timing),
            0x71 => Some(Self::Driver),
            0x7E => Some(Self::Proc),
            0x8B => Some(Self::LuaStr),
            0x98 => Some(Self::Mpq),
            0xB2 => Some(Self::PageA),
            0xBF => Some(Self::PageB),
            0xD9 => Some(Self::Module),
            0xF3 => Some(Self::Mem),
            _ => None,
        }
    }

    fn has_data(self) -> bool {
        matches!(self, Self::PageA | Self::PageB | Self::Driver)
    }

    fn has_address(self) -> bool {
        matches!(self, Self::Mem | Self::PageA | Self::PageB | Self::Proc)
    }

    fn has_str(self) -> bool {
        matches!(
            self,
            Self::Mem | Self::Mpq | Self::LuaStr | Self::Driver | Self::Module
        )
    }

    fn has_result(self) -> bool {
        matches!(self, Self::Mpq | Self::Mem)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenCheck {
    pub kind: WardenCheckType,
    /// Id stored in the row, independent of the internal id.
    pub id: u32,
    pub data: Vec<u8>,
    pub address: u32,
    pub length: u8,
    pub string: String,
    pub comment: String,
    pub action: u8,
}

/// Loaded checks keyed by internal id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenDataStorage {
    checks: BTreeMap<u32, WardenCheck>,
    results: BTreeMap<u32, Vec<u8>>,
    mem_check_ids: Vec<u32>,
    next_internal_id: u32,
}

impl Default for WardenDataStorage {
    fn default() -> Self {
        Self {
            checks: BTreeMap::new(),
            results: BTreeMap::new(),
            mem_check_ids: Vec::new(),
            next_internal_id: 1,
        }
    }
}

fn decode_hex(column: &str, value: &str) -> Result<Vec<u8>, RowError> {
    hex::decode(value.trim()).map_err(|e| RowError::Invalid(format!("bad hex in `{column}`: {e}")))
}

impl WardenDataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `warden_data_result (check, data, result, address, length, str,
    /// id, comment, action)`.
    pub fn load(&mut self, db: &dyn Database, reload: bool) -> Result<usize, StorageError> {
        if reload {
            *self = Self::default();
        }

        let Some(result) = db.query(TABLE)? else {
            info!(">> Loaded 0 warden data and results");
            return Ok(0);
        };

        let mut count = 0;
        for row in result.rows() {
            let internal_id = self.next_internal_id;
            self.next_internal_id += 1;
            match self.load_row(internal_id, row) {
                Ok(()) => count += 1,
                Err(e) => error!("Table `{}` check {} skipped: {}", TABLE, internal_id, e),
            }
        }

        info!(">> Loaded {} warden data and results", count);
        Ok(count)
    }

    fn load_row(&mut self, internal_id: u32, row: &Row) -> Result<(), RowError> {
        let raw_kind = row.u8(0)?;
        let kind = WardenCheckType::from_u8(raw_kind)
            .ok_or_else(|| RowError::Invalid(format!("unknown check type {raw_kind:#x}")))?;

        let data = if kind.has_data() {
            decode_hex("data", &row.string(1)?)?
        } else {
            Vec::new()
        };
        let expected = if kind.has_result() {
            Some(decode_hex("result", &row.string(2)?)?)
        } else {
            None
        };
        let (address, length) = if kind.has_address() {
            (row.u32(3)?, row.u8(4)?)
        } else {
            (0, 0)
        };
        let string = if kind.has_str() {
            row.string(5)?
        } else {
            String::new()
        };

        let check = WardenCheck {
            kind,
            id: row.u32(6)?,
            data,
            address,
            length,
            string,
            comment: row.string(7)?,
            action: row.u8(8)?,
        };

        if matches!(kind, WardenCheckType::Mem | WardenCheckType::Module) {
            self.mem_check_ids.push(internal_id);
        }
        if let Some(expected) = expected {
            self.results.insert(internal_id, expected);
        }
        self.checks.insert(internal_id, check);
        Ok(())
    }

    pub fn get_check(&self, internal_id: u32) -> Option<&WardenCheck> {
        self.checks.get(&internal_id)
    }

    pub fn get_result(&self, internal_id: u32) -> Option<&[u8]> {
        self.results.get(&internal_id).map(Vec::as_slice)
    }

    /// Internal ids of memory and module checks, in load order.
    pub fn mem_check_ids(&self) -> &[u32] {
        &self.mem_check_ids
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::MemoryDatabase;

    fn sample_db() -> MemoryDatabase {
        let db = MemoryDatabase::new();
        db.insert_rows(
            TABLE,
            vec![
                row![0xF3, "", "0BEB", 0x00C9_3C60, 2, "", 1, "fly hack", 1],
                row![0xB2, "AABBCC", "", 0x0040_1000, 8, "", 2, "page", 0],
                row![0x01, "", "", 0, 0, "", 3, "bogus", 0],
                row![0xD9, "", "", 0, 0, "wpespy.dll", 4, "module", 2],
            ],
        );
        db
    }

    #[test]
    fn test_rows_decode_by_check_type() {
        let mut storage = WardenDataStorage::new();
        assert_eq!(storage.load(&sample_db(), false).unwrap(), 3);

        let mem = storage.get_check(1).unwrap();
        assert_eq!(mem.kind, WardenCheckType::Mem);
        assert_eq!(mem.address, 0x00C9_3C60);
        assert_eq!(storage.get_result(1), Some(&[0x0B, 0xEB][..]));

        let page = storage.get_check(2).unwrap();
        assert_eq!(page.data, vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(storage.get_result(2), None);

        // The bogus row still takes id 3.
        assert!(storage.get_check(3).is_none());
        assert_eq!(storage.get_check(4).unwrap().string, "wpespy.dll");
        assert_eq!(storage.mem_check_ids(), &[1, 4]);
    }

    #[test]
    fn test_reload_restarts_internal_ids() {
        let db = sample_db();
        let mut storage = WardenDataStorage::new();
        storage.load(&db, false).unwrap();
        storage.load(&db, true).unwrap();

        assert_eq!(storage.len(), 3);
        assert!(storage.get_check(5).is_none());
        assert_eq!(storage.mem_check_ids(), &[1, 4]);
    }

    #[test]
    fn test_rejected_row_consumes_an_internal_id() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            TABLE,
            vec![
                row![0x02, "", "", 0, 0, "", 10, "unknown", 0],
                row![0x8B, "", "", 0, 0, "GetText", 11, "lua", 0],
                row![0xB2, "zz", "", 0, 0, "", 12, "bad hex", 0],
                row![0x98, "", "00FF", 0, 0, "a.mpq", 13, "mpq", 1],
            ],
        );
        let mut storage = WardenDataStorage::new();
        assert_eq!(storage.load(&db, false).unwrap(), 2);

        assert!(storage.get_check(1).is_none());
        assert_eq!(storage.get_check(2).unwrap().id, 11);
        assert!(storage.get_check(3).is_none());
        assert_eq!(storage.get_check(4).unwrap().id, 13);
        assert_eq!(storage.get_result(4), Some(&[0x00, 0xFF][..]));
    }
}
