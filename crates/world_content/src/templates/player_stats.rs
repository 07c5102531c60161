//! Per race/class/level base stats.
//!
//! Level 1 is mandatory for every race/class pair that has any row; a gap
//! at a higher level is filled from the level below it.

use crate::error::{ContentError, RowError};
use crate::storage::{Database, Row};
use std::collections::BTreeMap;
use tracing::{error, info};

pub const MAX_RACES: u8 = 12;
pub const MAX_CLASSES: u8 = 12;
pub const MAX_STATS: usize = 5;

const TABLE: &str = "player_levelstats";

/// Strength, agility, stamina, intellect, spirit.
pub type StatBlock = [u16; MAX_STATS];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerLevelStats {
    /// Stats indexed by `level - 1`, always `max_level` long.
    by_pair: BTreeMap<(u8, u8), Vec<StatBlock>>,
}

struct LevelRow {
    race: u8,
    class: u8,
    level: u8,
    stats: StatBlock,
}

fn decode(row: &Row) -> Result<LevelRow, RowError> {
    Ok(LevelRow {
        race: row.u8(0)?,
        class: row.u8(1)?,
        level: row.u8(2)?,
        stats: [row.u16(3)?, row.u16(4)?, row.u16(5)?, row.u16(6)?, row.u16(7)?],
    })
}

impl PlayerLevelStats {
    /// Loads `player_levelstats (race, class, level, str, agi, sta, int, spi)`.
    pub fn load(db: &dyn Database, max_level: u8) -> Result<Self, ContentError> {
        let max_level = max_level.max(1);
        let mut rows: BTreeMap<(u8, u8), BTreeMap<u8, StatBlock>> = BTreeMap::new();

        let Some(result) = db.query(TABLE)? else {
            return Err(ContentError::MissingBaseline {
                table: TABLE,
                detail: "table is empty".into(),
            });
        };

        for row in result.rows() {
            let parsed = match decode(row) {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!("Table `{}` row skipped: {}", TABLE, e);
                    continue;
                }
            };
            if parsed.race == 0 || parsed.race >= MAX_RACES {
                error!("Wrong race {} in `{}` table, ignoring.", parsed.race, TABLE);
                continue;
            }
            if parsed.class == 0 || parsed.class >= MAX_CLASSES {
                error!("Wrong class {} in `{}` table, ignoring.", parsed.class, TABLE);
                continue;
            }
            if parsed.level == 0 || parsed.level > max_level {
                continue;
            }
            rows.entry((parsed.race, parsed.class))
                .or_default()
                .insert(parsed.level, parsed.stats);
        }

        let mut by_pair = BTreeMap::new();
        for ((race, class), levels) in rows {
            let Some(first) = levels.get(&1).copied() else {
                return Err(ContentError::MissingBaseline {
                    table: TABLE,
                    detail: format!("race {race} class {class} level 1 does not have stats data"),
                });
            };

            let mut filled = Vec::with_capacity(max_level as usize);
            filled.push(first);
            for level in 2..=max_level {
                let stats = match levels.get(&level) {
                    Some(stats) => *stats,
                    None => {
                        error!(
                            "Race {} Class {} Level {} does not have stats data. Using stats data of level {}.",
                            race,
                            class,
                            level,
                            level - 1
                        );
                        filled[(level - 2) as usize]
                    }
                };
                filled.push(stats);
            }
            by_pair.insert((race, class), filled);
        }

        info!(">> Loaded {} level stats definitions", by_pair.len());
        Ok(Self { by_pair })
    }

    /// Stats for a level, `None` for unknown pairs or levels out of range.
    pub fn get(&self, race: u8, class: u8, level: u8) -> Option<&StatBlock> {
        let index = usize::from(level).checked_sub(1)?;
        self.by_pair.get(&(race, class))?.get(index)
    }

    /// Number of race/class pairs.
    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::MemoryDatabase;

    #[test]
    fn test_gaps_are_filled_from_previous_level() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            TABLE,
            vec![
                row![1, 1, 1, 23, 20, 22, 20, 21],
                row![1, 1, 3, 25, 21, 23, 20, 21],
                row![1, 1, 80, 99, 99, 99, 99, 99],
            ],
        );

        let stats = PlayerLevelStats::load(&db, 4).unwrap();
        assert_eq!(stats.get(1, 1, 2), Some(&[23, 20, 22, 20, 21]));
        assert_eq!(stats.get(1, 1, 3), Some(&[25, 21, 23, 20, 21]));
        assert_eq!(stats.get(1, 1, 4), Some(&[25, 21, 23, 20, 21]));
        assert_eq!(stats.get(1, 1, 5), None);
        assert_eq!(stats.get(1, 1, 0), None);
    }

    #[test]
    fn test_missing_level_one_is_fatal() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            TABLE,
            vec![
                row![1, 1, 1, 23, 20, 22, 20, 21],
                row![2, 1, 2, 26, 17, 24, 17, 23],
            ],
        );

        let err = PlayerLevelStats::load(&db, 70).unwrap_err();
        assert!(matches!(err, ContentError::MissingBaseline { .. }));
    }

    #[test]
    fn test_invalid_race_rows_are_ignored() {
        let db = MemoryDatabase::new();
        db.insert_rows(
            TABLE,
            vec![row![1, 1, 1, 23, 20, 22, 20, 21], row![40, 1, 2, 1, 1, 1, 1, 1]],
        );

        let stats = PlayerLevelStats::load(&db, 70).unwrap();
        assert_eq!(stats.len(), 1);
    }
}
