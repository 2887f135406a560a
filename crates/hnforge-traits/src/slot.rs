//! Trait slots: the derivation dimensions of an entity

use crate::error::TraitError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of item slots per hero
pub const ITEM_SLOTS: u8 = 8;

/// One derivation dimension
///
/// The string form (`class`, `item1` … `item8`) is part of the hash input
/// and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TraitSlot {
    /// Hero class
    Class,
    /// Item slot `1..=ITEM_SLOTS`
    Item(u8),
}

impl TraitSlot {
    /// Create an item slot
    ///
    /// # Errors
    /// Returns `TraitError::UnknownSlot` outside `1..=ITEM_SLOTS`
    pub fn item(n: u8) -> Result<Self, TraitError> {
        if (1..=ITEM_SLOTS).contains(&n) {
            Ok(Self::Item(n))
        } else {
            Err(TraitError::UnknownSlot(format!("item{n}")))
        }
    }

    /// Tag bytes hashed during derivation
    #[must_use]
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl Display for TraitSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => f.write_str("class"),
            Self::Item(n) => write!(f, "item{n}"),
        }
    }
}

impl FromStr for TraitSlot {
    type Err = TraitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "class" {
            return Ok(Self::Class);
        }
        s.strip_prefix("item")
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(|n| Self::item(n).ok())
            .ok_or_else(|| TraitError::UnknownSlot(s.to_string()))
    }
}

impl TryFrom<String> for TraitSlot {
    type Error = TraitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TraitSlot> for String {
    fn from(slot: TraitSlot) -> Self {
        slot.to_string()
    }
}
