//! Layer selection
//!
//! Maps `(series, class, level)` to the ordered hero layers drawn between the
//! level background and the finishing overlays. The tables are reproduced
//! exactly: later layers draw over earlier ones, so any reordering changes
//! the rendered output.
//!
//! Background, class effect underlay and finishing overlays are added by the
//! renderer, not here.

use crate::error::TraitError;
use crate::types::{HeroClass, Series, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Reference to one hero layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerRef {
    /// Hero base body
    Hero,
    /// Item slot `1..=8`; the variant comes from the entity profile
    Item(u8),
}

impl Display for LayerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hero => f.write_str("hero"),
            Self::Item(n) => write!(f, "item{n}"),
        }
    }
}

use LayerRef::{Hero as H, Item as I};

/// Ordered hero layers for `(series, class, level)`
///
/// Level 0 yields an empty set.
///
/// # Errors
/// Returns `TraitError::LevelOutOfRange` for levels above `MAX_LEVEL`
pub fn layers_for(series: Series, class: HeroClass, level: u8) -> Result<Vec<LayerRef>, TraitError> {
    if level > MAX_LEVEL {
        return Err(TraitError::LevelOutOfRange {
            level,
            max: MAX_LEVEL,
        });
    }
    if level == 0 {
        return Ok(Vec::new());
    }

    let layers: &[LayerRef] = match series {
        Series::Basic => &[H, I(1), I(2)],
        Series::Two => series_two(class, level),
    };
    Ok(layers.to_vec())
}

fn series_two(class: HeroClass, level: u8) -> &'static [LayerRef] {
    // Cavalryman carries its accessory (item1) on top; everyone else wears it
    // right over the body. Blade draws item7 under its other gear from level 4.
    match (class, level) {
        (HeroClass::Cavalryman, 1) => &[H, I(2), I(1)],
        (HeroClass::Cavalryman, 2) => &[H, I(3), I(4), I(1)],
        (HeroClass::Cavalryman, 3) => &[H, I(3), I(5), I(6), I(1)],
        (HeroClass::Cavalryman, 4) => &[H, I(3), I(5), I(6), I(7), I(1)],
        (HeroClass::Cavalryman, _) => &[H, I(3), I(5), I(6), I(7), I(1), I(8)],

        (HeroClass::Blade, 4) => &[H, I(1), I(7), I(3), I(5), I(6)],
        (HeroClass::Blade, 5) => &[H, I(1), I(7), I(3), I(5), I(6), I(8)],

        (_, 1) => &[H, I(1), I(2)],
        (_, 2) => &[H, I(1), I(3), I(4)],
        (_, 3) => &[H, I(1), I(3), I(5), I(6)],
        (_, 4) => &[H, I(1), I(3), I(5), I(6), I(7)],
        (_, _) => &[H, I(1), I(3), I(5), I(6), I(7), I(8)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_zero_is_empty() {
        for class in HeroClass::ALL {
            assert!(layers_for(Series::Two, class, 0).unwrap().is_empty());
            assert!(layers_for(Series::Basic, class, 0).unwrap().is_empty());
        }
    }

    #[test]
    fn level_above_max_is_rejected() {
        assert!(layers_for(Series::Two, HeroClass::Holy, 6).is_err());
    }

    #[test]
    fn hero_always_first() {
        for class in HeroClass::ALL {
            for level in 1..=MAX_LEVEL {
                let layers = layers_for(Series::Two, class, level).unwrap();
                assert_eq!(layers[0], LayerRef::Hero);
            }
        }
    }
}
