//! Full derived trait set of one entity

use crate::derive::derive;
use crate::slot::{TraitSlot, ITEM_SLOTS};
use crate::types::{EntityId, HeroClass};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;

/// Number of hero classes
pub const CLASS_RANGE: NonZeroU64 = NonZeroU64::MIN.saturating_add(3);

/// Number of variants per item slot
pub const ITEM_VARIANTS: NonZeroU64 = NonZeroU64::MIN.saturating_add(9);

/// Derived static traits of an entity
///
/// Computed once per entity task and shared by every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedProfile {
    /// Entity the traits belong to
    pub id: EntityId,
    /// Hero class (`class` slot, base 1, range 4)
    pub class: HeroClass,
    /// Variant of `item1..=item8` (base 1, range 10), index 0 is `item1`
    pub items: [u8; ITEM_SLOTS as usize],
}

impl DerivedProfile {
    /// Derive every static trait of `id`
    #[must_use]
    pub fn derive(id: EntityId) -> Self {
        // base 0 keeps the index in 0..4; identical residue to base 1
        let class_idx = derive(id, &TraitSlot::Class, 0, CLASS_RANGE);
        let class = HeroClass::ALL[usize::try_from(class_idx).unwrap_or(0) % HeroClass::ALL.len()];

        let mut items = [0u8; ITEM_SLOTS as usize];
        for (slot, variant) in (1..=ITEM_SLOTS).zip(items.iter_mut()) {
            let value = derive(id, &TraitSlot::Item(slot), 1, ITEM_VARIANTS);
            *variant = u8::try_from(value).unwrap_or(1);
        }

        Self { id, class, items }
    }

    /// Variant of item slot `slot` (`1..=ITEM_SLOTS`)
    #[must_use]
    pub fn item_variant(&self, slot: u8) -> Option<u8> {
        let idx = usize::from(slot.checked_sub(1)?);
        self.items.get(idx).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_for_entity_42() {
        let profile = DerivedProfile::derive(EntityId::new(42));
        assert_eq!(profile.class, HeroClass::Hex);
        assert_eq!(profile.items, [1, 4, 6, 1, 7, 6, 9, 7]);
    }

    #[test]
    fn profile_for_first_ids() {
        assert_eq!(DerivedProfile::derive(EntityId::new(0)).class, HeroClass::Holy);
        assert_eq!(DerivedProfile::derive(EntityId::new(9)).class, HeroClass::Cavalryman);
        assert_eq!(DerivedProfile::derive(EntityId::new(6)).class, HeroClass::Blade);
        assert_eq!(
            DerivedProfile::derive(EntityId::new(60_000)).items,
            [9, 3, 5, 9, 3, 1, 7, 1]
        );
    }

    #[test]
    fn item_variant_lookup() {
        let profile = DerivedProfile::derive(EntityId::new(42));
        assert_eq!(profile.item_variant(1), Some(1));
        assert_eq!(profile.item_variant(8), Some(7));
        assert_eq!(profile.item_variant(0), None);
        assert_eq!(profile.item_variant(9), None);
    }
}
