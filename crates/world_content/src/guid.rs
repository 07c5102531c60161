//! Packed 64-bit object identifiers.
//!
//! The high 16 bits carry the type tag. Types that are instances of a
//! template also carry the template entry in bits 24..48, leaving 24 bits of
//! low GUID; the others use the full low 32 bits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Class-scoped part of an object identifier.
pub type LowGuid = u32;

/// Type tag stored in the high bits of an [`ObjectGuid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HighGuid {
    Player,
    Item,
    DynamicObject,
    Corpse,
    GameObject,
    Transport,
    Unit,
    Pet,
    MoTransport,
}

impl HighGuid {
    pub const fn tag(self) -> u16 {
        match self {
            HighGuid::Player => 0x0000,
            HighGuid::Item => 0x4000,
            HighGuid::DynamicObject => 0xF100,
            HighGuid::Corpse => 0xF101,
            HighGuid::GameObject => 0xF110,
            HighGuid::Transport => 0xF120,
            HighGuid::Unit => 0xF130,
            HighGuid::Pet => 0xF140,
            HighGuid::MoTransport => 0x1FC0,
        }
    }

    pub fn from_tag(tag: u16) -> Option<HighGuid> {
        [
            HighGuid::Player,
            HighGuid::Item,
            HighGuid::DynamicObject,
            HighGuid::Corpse,
            HighGuid::GameObject,
            HighGuid::Transport,
            HighGuid::Unit,
            HighGuid::Pet,
            HighGuid::MoTransport,
        ]
        .into_iter()
        .find(|h| h.tag() == tag)
    }

    /// Whether GUIDs of this type embed a template entry.
    pub const fn has_entry(self) -> bool {
        matches!(
            self,
            HighGuid::GameObject | HighGuid::Transport | HighGuid::Unit | HighGuid::Pet
        )
    }
}

/// A full object identifier as seen by clients and scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ObjectGuid(u64);

impl ObjectGuid {
    pub const EMPTY: ObjectGuid = ObjectGuid(0);

    /// Packs a GUID. `entry` is ignored for types without an entry.
    pub fn new(high: HighGuid, entry: u32, low: LowGuid) -> Self {
        let raw = if high.has_entry() {
            (low as u64 & 0x00FF_FFFF)
                | ((entry as u64 & 0x00FF_FFFF) << 24)
                | ((high.tag() as u64) << 48)
        } else {
            low as u64 | ((high.tag() as u64) << 48)
        };
        Self(raw)
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn high(self) -> Option<HighGuid> {
        HighGuid::from_tag((self.0 >> 48) as u16)
    }

    pub fn entry(self) -> u32 {
        match self.high() {
            Some(high) if high.has_entry() => ((self.0 >> 24) & 0x00FF_FFFF) as u32,
            _ => 0,
        }
    }

    pub fn low(self) -> LowGuid {
        match self.high() {
            Some(high) if high.has_entry() => (self.0 & 0x00FF_FFFF) as u32,
            _ => (self.0 & 0xFFFF_FFFF) as u32,
        }
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.high() {
            Some(high) if high.has_entry() => {
                write!(f, "{:?} (entry {}, low {})", high, self.entry(), self.low())
            }
            Some(high) => write!(f, "{:?} (low {})", high, self.low()),
            None => write!(f, "{:#018x}", self.0),
        }
    }
}
