//! Asset layout and render plans
//!
//! A [`RenderPlan`] is the full, ordered list of files composited for one
//! `(entity, level)`:
//! 1. level background
//! 2. class effect underlay
//! 3. hero layers from [`layers_for`]
//! 4. series finishing overlays (info frame, level bar or hero effect)

use crate::error::RenderError;
use hnforge_traits::{layers_for, DerivedProfile, LayerRef, Level, Series};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ordered files for one composed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Bottom image; defines the canvas size
    pub background: PathBuf,
    /// Overlays drawn bottom to top
    pub overlays: Vec<PathBuf>,
}

impl RenderPlan {
    /// Every file the plan touches, background first
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.background.as_path()).chain(self.overlays.iter().map(PathBuf::as_path))
    }
}

/// On-disk layout of the layer library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: PathBuf,
    series: Series,
}

impl AssetLayout {
    /// Create layout rooted at `root` (the directory holding `bg/`, `class*/`)
    ///
    /// Series two assets live in the `s2` subdirectory of the root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, series: Series) -> Self {
        Self {
            root: root.into(),
            series,
        }
    }

    /// Series this layout renders
    #[inline]
    #[must_use]
    pub fn series(&self) -> Series {
        self.series
    }

    /// Directory all plan paths are relative to
    #[must_use]
    pub fn series_dir(&self) -> PathBuf {
        match self.series {
            Series::Basic => self.root.clone(),
            Series::Two => self.root.join("s2"),
        }
    }

    /// Build the render plan for `profile` at `level`
    ///
    /// # Errors
    /// Returns `RenderError::MissingVariant` if the profile lacks an item the
    /// layer table asks for
    pub fn plan(&self, profile: &DerivedProfile, level: Level) -> Result<RenderPlan, RenderError> {
        let dir = self.series_dir();
        let class_dir = dir.join(format!("class{}", profile.class.index()));
        let lvl = level.get();

        let mut overlays = vec![class_dir.join("effect").join("bg").join(format!("{lvl}.png"))];

        for layer in layers_for(self.series, profile.class, lvl)? {
            overlays.push(match layer {
                LayerRef::Hero => class_dir.join("hero.png"),
                LayerRef::Item(slot) => {
                    let variant = profile
                        .item_variant(slot)
                        .ok_or(RenderError::MissingVariant(slot))?;
                    class_dir.join(format!("item{slot}")).join(format!("{variant}.png"))
                }
            });
        }

        match self.series {
            Series::Basic => {
                overlays.push(class_dir.join("effect").join("hero").join(format!("{lvl}.png")));
                overlays.push(class_dir.join("info.png"));
            }
            Series::Two => {
                overlays.push(class_dir.join("info.png"));
                overlays.push(dir.join("bar").join(format!("{lvl}.png")));
            }
        }

        Ok(RenderPlan {
            background: dir.join("bg").join(format!("{lvl}.png")),
            overlays,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnforge_traits::EntityId;

    fn rel(plan: &RenderPlan, root: &Path) -> Vec<String> {
        plan.files()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn series_two_plan_for_entity_42_level_3() {
        // entity 42: class 4 (Hex), items [1, 4, 6, 1, 7, 6, 9, 7]
        let layout = AssetLayout::new("nft", Series::Two);
        let profile = DerivedProfile::derive(EntityId::new(42));
        let plan = layout.plan(&profile, Level::new(3).unwrap()).unwrap();

        assert_eq!(
            rel(&plan, Path::new("nft")),
            vec![
                "s2/bg/3.png",
                "s2/class4/effect/bg/3.png",
                "s2/class4/hero.png",
                "s2/class4/item1/1.png",
                "s2/class4/item3/6.png",
                "s2/class4/item5/7.png",
                "s2/class4/item6/6.png",
                "s2/class4/info.png",
                "s2/bar/3.png",
            ]
        );
    }

    #[test]
    fn basic_plan_uses_hero_effect() {
        let layout = AssetLayout::new("nft", Series::Basic);
        let profile = DerivedProfile::derive(EntityId::new(42));
        let plan = layout.plan(&profile, Level::new(2).unwrap()).unwrap();

        assert_eq!(
            rel(&plan, Path::new("nft")),
            vec![
                "bg/2.png",
                "class4/effect/bg/2.png",
                "class4/hero.png",
                "class4/item1/1.png",
                "class4/item2/4.png",
                "class4/effect/hero/2.png",
                "class4/info.png",
            ]
        );
    }
}
