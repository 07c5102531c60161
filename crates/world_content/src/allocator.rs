//! Low GUID allocation.
//!
//! Every identifier class owns one counter seeded from the highest persisted
//! id + 1. Units and game objects can additionally run split: the space
//! between the seed and the class maximum is divided once at startup into a
//! persistent sub-range (spawns that end up in storage) and a temporary
//! sub-range (summons and other short-lived objects).
//!
//! ```text
//!  base            temporary_start                       max
//!   |---- persistent ---->|------------ temporary -------->|
//! ```
//!
//! If the persistent cursor catches up with the temporary cursor the range
//! falls back to a single regular counter that continues from the temporary
//! cursor; the split is not restored for the rest of the process lifetime.

use crate::config::{GuidSettings, DEFAULT_TEMPORARY_PROPORTION, TEMPORARY_PROPORTION_RANGE};
use crate::error::{ContentError, GuidError};
use crate::guid::{HighGuid, LowGuid, ObjectGuid};
use crate::storage::Database;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{info, warn};

/// Which database holds the persisted maximum of an identifier class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    World,
    Character,
}

/// Identifier namespaces with independent counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierClass {
    Player,
    Item,
    Unit,
    GameObject,
    Pet,
    Corpse,
    DynamicObject,
    MoTransport,
    Mail,
    ItemText,
    Guild,
    ArenaTeam,
    Auction,
}

impl IdentifierClass {
    pub const ALL: [IdentifierClass; 13] = [
        IdentifierClass::Player,
        IdentifierClass::Item,
        IdentifierClass::Unit,
        IdentifierClass::GameObject,
        IdentifierClass::Pet,
        IdentifierClass::Corpse,
        IdentifierClass::DynamicObject,
        IdentifierClass::MoTransport,
        IdentifierClass::Mail,
        IdentifierClass::ItemText,
        IdentifierClass::Guild,
        IdentifierClass::ArenaTeam,
        IdentifierClass::Auction,
    ];

    /// Highest low GUID the class may hand out.
    pub const fn max_low(self) -> u32 {
        match self {
            IdentifierClass::Unit | IdentifierClass::GameObject | IdentifierClass::Pet => {
                0x00FF_FFFE
            }
            _ => 0xFFFF_FFFE,
        }
    }

    /// Only units and game objects can carve out a temporary sub-range.
    pub const fn supports_temporary_range(self) -> bool {
        matches!(self, IdentifierClass::Unit | IdentifierClass::GameObject)
    }

    /// Table and key column holding the persisted maximum, if the class is
    /// persisted at all.
    pub const fn seed_source(self) -> Option<(SeedSource, &'static str, usize)> {
        match self {
            IdentifierClass::Player => Some((SeedSource::Character, "characters", 0)),
            IdentifierClass::Item => Some((SeedSource::Character, "item_instance", 0)),
            IdentifierClass::Corpse => Some((SeedSource::Character, "corpse", 0)),
            IdentifierClass::Mail => Some((SeedSource::Character, "mail", 0)),
            IdentifierClass::ItemText => Some((SeedSource::Character, "item_text", 0)),
            IdentifierClass::Guild => Some((SeedSource::Character, "guild", 0)),
            IdentifierClass::ArenaTeam => Some((SeedSource::Character, "arena_team", 0)),
            IdentifierClass::Auction => Some((SeedSource::Character, "auction", 0)),
            IdentifierClass::Unit => Some((SeedSource::World, "creature", 0)),
            IdentifierClass::GameObject => Some((SeedSource::World, "gameobject", 0)),
            IdentifierClass::MoTransport => Some((SeedSource::World, "transports", 0)),
            IdentifierClass::Pet | IdentifierClass::DynamicObject => None,
        }
    }

    /// Class that allocates low GUIDs for objects of the given type tag.
    pub const fn for_high_guid(high: HighGuid) -> IdentifierClass {
        match high {
            HighGuid::Player => IdentifierClass::Player,
            HighGuid::Item => IdentifierClass::Item,
            HighGuid::DynamicObject => IdentifierClass::DynamicObject,
            HighGuid::Corpse => IdentifierClass::Corpse,
            HighGuid::GameObject | HighGuid::Transport => IdentifierClass::GameObject,
            HighGuid::Unit => IdentifierClass::Unit,
            HighGuid::Pet => IdentifierClass::Pet,
            HighGuid::MoTransport => IdentifierClass::MoTransport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeState {
    /// One counter, the temporary flag is ignored.
    Regular { next: u32 },
    /// Two cursors; `temporary_start` is frozen at construction.
    Split {
        persistent: u32,
        temporary: u32,
        temporary_start: u32,
    },
}

/// Counter state of one identifier class.
#[derive(Debug)]
pub struct GuidRange {
    class: IdentifierClass,
    max: u32,
    state: Mutex<RangeState>,
}

impl GuidRange {
    pub fn regular(class: IdentifierClass, base: u32, max: u32) -> Self {
        Self {
            class,
            max,
            state: Mutex::new(RangeState::Regular { next: base }),
        }
    }

    /// Splits `[base, max]` with `proportion` percent of it reserved for
    /// temporary objects at the top. Out-of-range proportions fall back to
    /// the default.
    pub fn split(class: IdentifierClass, base: u32, max: u32, proportion: u32) -> Self {
        let proportion = if TEMPORARY_PROPORTION_RANGE.contains(&proportion) {
            proportion
        } else {
            warn!(
                "Temporary GUID proportion {} out of range {}..={}, using {}",
                proportion,
                TEMPORARY_PROPORTION_RANGE.start(),
                TEMPORARY_PROPORTION_RANGE.end(),
                DEFAULT_TEMPORARY_PROPORTION
            );
            DEFAULT_TEMPORARY_PROPORTION
        };

        let span = u64::from(max.saturating_sub(base));
        let temporary_start = u64::from(base) + span * u64::from(100 - proportion) / 100;
        // Bounded by max, so the cast cannot truncate.
        let temporary_start = temporary_start as u32;

        Self {
            class,
            max,
            state: Mutex::new(RangeState::Split {
                persistent: base,
                temporary: temporary_start,
                temporary_start,
            }),
        }
    }

    pub fn class(&self) -> IdentifierClass {
        self.class
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Hands out the next low GUID. In regular mode `temporary` is ignored.
    pub fn allocate(&self, temporary: bool) -> Result<u32, GuidError> {
        let exhausted = GuidError::Exhausted {
            class: self.class,
            max: self.max,
        };
        let mut state = self.state.lock();

        match *state {
            RangeState::Regular { next } => {
                if next >= self.max {
                    return Err(exhausted);
                }
                *state = RangeState::Regular { next: next + 1 };
                Ok(next)
            }
            RangeState::Split {
                persistent,
                temporary: cursor,
                temporary_start,
            } if temporary => {
                if cursor >= self.max {
                    return Err(exhausted);
                }
                *state = RangeState::Split {
                    persistent,
                    temporary: cursor + 1,
                    temporary_start,
                };
                Ok(cursor)
            }
            RangeState::Split {
                persistent,
                temporary: cursor,
                temporary_start,
            } => {
                if persistent.saturating_add(1) >= cursor {
                    warn!(
                        "{:?} persistent GUID range reached the temporary range at {}, \
                         continuing with a single counter",
                        self.class, cursor
                    );
                    if cursor >= self.max {
                        *state = RangeState::Regular { next: cursor };
                        return Err(exhausted);
                    }
                    *state = RangeState::Regular { next: cursor + 1 };
                    return Ok(cursor);
                }
                *state = RangeState::Split {
                    persistent: persistent + 1,
                    temporary: cursor,
                    temporary_start,
                };
                Ok(persistent)
            }
        }
    }

    /// Whether `low` lies in the frozen temporary sub-range. Always false
    /// once the range runs regular.
    pub fn is_in_temporary_range(&self, low: u32) -> bool {
        match *self.state.lock() {
            RangeState::Regular { .. } => false,
            RangeState::Split {
                temporary_start, ..
            } => low >= temporary_start,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(*self.state.lock(), RangeState::Split { .. })
    }

    /// Frozen split point, `None` in regular mode.
    pub fn temporary_start(&self) -> Option<u32> {
        match *self.state.lock() {
            RangeState::Regular { .. } => None,
            RangeState::Split {
                temporary_start, ..
            } => Some(temporary_start),
        }
    }
}

/// All identifier counters of one world.
#[derive(Debug)]
pub struct ObjectGuidAllocator {
    ranges: HashMap<IdentifierClass, GuidRange>,
}

impl ObjectGuidAllocator {
    /// Seeds every class from the persisted maxima of both databases.
    pub fn from_databases(
        world_db: &dyn Database,
        character_db: &dyn Database,
        settings: &GuidSettings,
    ) -> Result<Self, ContentError> {
        let mut seeds = HashMap::new();
        for class in IdentifierClass::ALL {
            let seed = match class.seed_source() {
                Some((SeedSource::World, table, column)) => world_db.max_u32(table, column)?,
                Some((SeedSource::Character, table, column)) => {
                    character_db.max_u32(table, column)?
                }
                None => None,
            };
            seeds.insert(class, seed.map(|max| max.saturating_add(1)).unwrap_or(1));
        }

        let allocator = Self::with_seeds(&seeds, settings);
        for class in [IdentifierClass::Unit, IdentifierClass::GameObject] {
            let range = allocator.range(class);
            match range.temporary_start() {
                Some(start) => info!(
                    ">> {:?} GUIDs split: persistent from {}, temporary from {}",
                    class,
                    seeds.get(&class).copied().unwrap_or(1),
                    start
                ),
                None => info!(
                    ">> {:?} GUIDs regular from {}",
                    class,
                    seeds.get(&class).copied().unwrap_or(1)
                ),
            }
        }
        Ok(allocator)
    }

    /// Builds counters from explicit seeds; classes without a seed start at 1.
    pub fn with_seeds(seeds: &HashMap<IdentifierClass, u32>, settings: &GuidSettings) -> Self {
        let ranges = IdentifierClass::ALL
            .into_iter()
            .map(|class| {
                let base = seeds.get(&class).copied().unwrap_or(1);
                let max = class.max_low();
                let range = if settings.new_distribution && class.supports_temporary_range() {
                    GuidRange::split(class, base, max, settings.temporary_proportion)
                } else {
                    GuidRange::regular(class, base, max)
                };
                (class, range)
            })
            .collect();
        Self { ranges }
    }

    pub fn range(&self, class: IdentifierClass) -> &GuidRange {
        // Every class is inserted by the constructors.
        &self.ranges[&class]
    }

    pub fn generate_low_guid(
        &self,
        class: IdentifierClass,
        temporary: bool,
    ) -> Result<LowGuid, GuidError> {
        self.range(class).allocate(temporary)
    }

    /// Allocates a low GUID for `high` and packs it with `entry`.
    pub fn generate_guid(
        &self,
        high: HighGuid,
        entry: u32,
        temporary: bool,
    ) -> Result<ObjectGuid, GuidError> {
        let low = self.generate_low_guid(IdentifierClass::for_high_guid(high), temporary)?;
        Ok(ObjectGuid::new(high, entry, low))
    }

    pub fn is_in_temporary_range(&self, class: IdentifierClass, low: LowGuid) -> bool {
        self.range(class).is_in_temporary_range(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::storage::MemoryDatabase;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_split_point_and_first_allocations() {
        let range = GuidRange::split(IdentifierClass::Unit, 1, 1000, 90);
        assert_eq!(range.temporary_start(), Some(100));
        assert_eq!(range.allocate(false).unwrap(), 1);
        assert_eq!(range.allocate(true).unwrap(), 100);
        assert_eq!(range.allocate(false).unwrap(), 2);
        assert_eq!(range.allocate(true).unwrap(), 101);
    }

    #[test]
    fn test_split_point_uses_wide_arithmetic() {
        let max = IdentifierClass::Item.max_low();
        let range = GuidRange::split(IdentifierClass::Item, 1, max, 50);
        let expected = 1 + (u64::from(max) - 1) * 50 / 100;
        assert_eq!(range.temporary_start(), Some(expected as u32));
    }

    #[test]
    fn test_out_of_range_proportion_uses_default() {
        for proportion in [0, 49, 96, 100] {
            let range = GuidRange::split(IdentifierClass::GameObject, 1, 1000, proportion);
            assert_eq!(range.temporary_start(), Some(100));
        }
        let edge = GuidRange::split(IdentifierClass::GameObject, 1, 1001, 50);
        assert_eq!(edge.temporary_start(), Some(501));
    }

    #[test]
    fn test_regular_ignores_temporary_flag() {
        let range = GuidRange::regular(IdentifierClass::Player, 7, 100);
        assert_eq!(range.allocate(true).unwrap(), 7);
        assert_eq!(range.allocate(false).unwrap(), 8);
        assert!(!range.is_in_temporary_range(99));
        assert!(!range.is_split());
    }

    #[test]
    fn test_regular_exhaustion_is_error() {
        let range = GuidRange::regular(IdentifierClass::Mail, 9, 10);
        assert_eq!(range.allocate(false).unwrap(), 9);
        assert_eq!(
            range.allocate(false),
            Err(GuidError::Exhausted {
                class: IdentifierClass::Mail,
                max: 10
            })
        );
        // Stays exhausted, does not wrap.
        assert!(range.allocate(false).is_err());
    }

    #[test]
    fn test_temporary_exhaustion_is_error() {
        let range = GuidRange::split(IdentifierClass::Unit, 1, 1000, 90);
        for expected in 100..1000 {
            assert_eq!(range.allocate(true).unwrap(), expected);
        }
        assert!(matches!(
            range.allocate(true),
            Err(GuidError::Exhausted { .. })
        ));
        // Persistent side is unaffected.
        assert_eq!(range.allocate(false).unwrap(), 1);
    }

    #[test]
    fn test_persistent_catching_up_falls_back_to_regular() {
        let range = GuidRange::split(IdentifierClass::Unit, 1, 1000, 90);
        assert_eq!(range.allocate(true).unwrap(), 100);
        assert_eq!(range.allocate(true).unwrap(), 101);

        // Temporary cursor sits at 102, so persistent ids stop at 100.
        let mut last = 0;
        for _ in 0..100 {
            let id = range.allocate(false).unwrap();
            assert!(range.is_split());
            assert!(id > last);
            last = id;
        }
        assert_eq!(last, 100);

        let fallback = range.allocate(false).unwrap();
        assert_eq!(fallback, 102);
        assert!(!range.is_split());
        assert!(!range.is_in_temporary_range(500));
        assert_eq!(range.allocate(true).unwrap(), 103);
        assert_eq!(range.allocate(false).unwrap(), 104);
    }

    #[test]
    fn test_fallback_one_below_split_point() {
        let range = GuidRange::split(IdentifierClass::GameObject, 1, 1000, 90);
        for expected in 1..=98 {
            assert_eq!(range.allocate(false).unwrap(), expected);
        }
        assert!(range.is_in_temporary_range(100));

        assert_eq!(range.allocate(false).unwrap(), 100);
        assert!(!range.is_in_temporary_range(100));
        assert!(!range.is_in_temporary_range(999));
        assert_eq!(range.allocate(false).unwrap(), 101);
    }

    #[test]
    fn test_is_in_temporary_range_uses_frozen_start() {
        let range = GuidRange::split(IdentifierClass::GameObject, 1, 1000, 90);
        range.allocate(true).unwrap();
        range.allocate(true).unwrap();
        assert!(range.is_in_temporary_range(100));
        assert!(!range.is_in_temporary_range(99));
    }

    #[test]
    fn test_concurrent_allocations_are_unique() {
        let range = Arc::new(GuidRange::split(IdentifierClass::Unit, 1, 100_000, 50));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let range = Arc::clone(&range);
                thread::spawn(move || {
                    (0..500)
                        .map(|_| range.allocate(i % 2 == 0).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn test_seeds_from_persisted_maxima() {
        let world = MemoryDatabase::new();
        world.insert_rows("creature", vec![row![10, 299], row![42, 299]]);
        let characters = MemoryDatabase::new();
        characters.insert_rows("characters", vec![row![3, "Arthas"]]);

        let allocator =
            ObjectGuidAllocator::from_databases(&world, &characters, &GuidSettings::default())
                .unwrap();

        assert_eq!(
            allocator
                .generate_low_guid(IdentifierClass::Player, false)
                .unwrap(),
            4
        );
        assert_eq!(
            allocator
                .generate_low_guid(IdentifierClass::Unit, false)
                .unwrap(),
            43
        );
        assert_eq!(
            allocator
                .generate_low_guid(IdentifierClass::Pet, false)
                .unwrap(),
            1
        );
        assert_eq!(
            allocator
                .generate_low_guid(IdentifierClass::Item, true)
                .unwrap(),
            1
        );
        assert!(allocator.range(IdentifierClass::GameObject).is_split());
        assert!(!allocator.range(IdentifierClass::Pet).is_split());
    }

    #[test]
    fn test_new_distribution_off_keeps_units_regular() {
        let settings = GuidSettings {
            new_distribution: false,
            ..GuidSettings::default()
        };
        let allocator = ObjectGuidAllocator::with_seeds(&HashMap::new(), &settings);
        assert!(!allocator.range(IdentifierClass::Unit).is_split());

        let guid = allocator
            .generate_guid(HighGuid::Unit, 299, true)
            .unwrap();
        assert_eq!(guid.low(), 1);
        assert_eq!(guid.entry(), 299);
    }
}
