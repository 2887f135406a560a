//! Identifier and tier types shared across the workspace
//!
//! - [`EntityId`]: the immutable token number that seeds every derived trait
//! - [`Level`]: a rendering tier in `1..=MAX_LEVEL`
//! - [`Series`]: the collection generation selecting layouts and texts
//! - [`HeroClass`]: the derived class of an entity

use crate::error::TraitError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Highest level any layer table defines
pub const MAX_LEVEL: u8 = 5;

/// Unique, immutable identifier of a minted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity id
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// ABI `uint256` encoding (32 bytes, big-endian)
    #[must_use]
    pub fn to_uint256(self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&self.0.to_be_bytes());
        word
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rendering tier of an entity, always in `1..=MAX_LEVEL`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    /// Lowest renderable level
    pub const MIN: Self = Self(1);

    /// Highest renderable level
    pub const MAX: Self = Self(MAX_LEVEL);

    /// Create a level
    ///
    /// # Errors
    /// Returns `TraitError::LevelOutOfRange` unless `1 <= level <= MAX_LEVEL`
    pub fn new(level: u8) -> Result<Self, TraitError> {
        if (1..=MAX_LEVEL).contains(&level) {
            Ok(Self(level))
        } else {
            Err(TraitError::LevelOutOfRange {
                level,
                max: MAX_LEVEL,
            })
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Every level from 1 up to and including `max`
    ///
    /// `max` is clamped to `MAX_LEVEL`.
    pub fn up_to(max: u8) -> impl Iterator<Item = Level> {
        (1..=max.min(MAX_LEVEL)).map(Level)
    }
}

impl TryFrom<u8> for Level {
    type Error = TraitError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collection generation
///
/// Each series has its own asset directory, layer table and metadata text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// First series ("I AM MT"), fixed three-layer hero
    Basic,
    /// Second series ("Hash Warfare"), level-dependent item layers
    #[default]
    Two,
}

impl Series {
    /// Label used in the `Series` metadata attribute
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Two => "Series 2",
        }
    }
}

impl FromStr for Series {
    type Err = TraitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "1" | "s1" => Ok(Self::Basic),
            "two" | "2" | "s2" => Ok(Self::Two),
            other => Err(TraitError::UnknownSeries(other.to_string())),
        }
    }
}

/// Derived hero class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeroClass {
    /// Class 1
    Cavalryman,
    /// Class 2
    Holy,
    /// Class 3
    Blade,
    /// Class 4
    Hex,
}

impl HeroClass {
    /// All classes in index order
    pub const ALL: [Self; 4] = [Self::Cavalryman, Self::Holy, Self::Blade, Self::Hex];

    /// Create from the 1-based class index
    ///
    /// # Errors
    /// Returns `TraitError::InvalidClass` outside `1..=4`
    pub fn from_index(index: u64) -> Result<Self, TraitError> {
        match index {
            1 => Ok(Self::Cavalryman),
            2 => Ok(Self::Holy),
            3 => Ok(Self::Blade),
            4 => Ok(Self::Hex),
            other => Err(TraitError::InvalidClass(other)),
        }
    }

    /// 1-based class index, as used in asset directories (`class{n}`)
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Cavalryman => 1,
            Self::Holy => 2,
            Self::Blade => 3,
            Self::Hex => 4,
        }
    }

    /// Display name used in the `Class` metadata attribute
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cavalryman => "Cavalryman",
            Self::Holy => "Holy",
            Self::Blade => "Blade",
            Self::Hex => "Hex",
        }
    }
}

impl Display for HeroClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
