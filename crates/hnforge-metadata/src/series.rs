//! Per-series metadata text and watermark settings

use hnforge_traits::{HeroClass, Series};
use serde::{Deserialize, Serialize};

/// Text overlay settings for the server-side image processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkStyle {
    /// Base64url font identifier
    pub font: String,
    /// Hex color without `#`
    pub color: String,
    /// Font size
    pub size: u32,
    /// Gravity anchor
    pub gravity: String,
    /// Horizontal offset
    pub x: u32,
    /// Vertical offset
    pub y: u32,
    /// Logo drawn centered on ultra entities
    pub ultra_logo_url: String,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            font: "enpnZnhpbmd5YW4".to_string(),
            color: "ffffff".to_string(),
            size: 24,
            gravity: "nw".to_string(),
            x: 395,
            y: 79,
            ultra_logo_url: "https://cdn.hashland.com/nft/logo/ultra_1024.png".to_string(),
        }
    }
}

/// Static text of one series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesProfile {
    /// Series this text belongs to
    pub series: Series,
    /// Display-name prefix (`"{collection} #{id}"`)
    pub collection: String,
    /// File stem prefix (`"{slug}-{id}-{level}"`)
    pub slug: String,
    /// Document description
    pub description: String,
    /// Value of the `Ip` attribute
    pub ip: String,
    /// Hero names indexed by class (1-based class minus one)
    pub heroes: [String; 4],
    /// Whether hashrate traits and watermark directives are emitted
    pub live_scores: bool,
    /// Watermark settings, used when `live_scores` is set
    pub watermark: WatermarkStyle,
}

impl SeriesProfile {
    /// Built-in profile for `series`
    #[must_use]
    pub fn for_series(series: Series) -> Self {
        match series {
            Series::Basic => Self {
                series,
                collection: "Hashland NFT".to_string(),
                slug: "hashland-nft".to_string(),
                description: "Have you ever imagined an NFT with BTC hashrate? HashLand did it, \
                              and now he brings the first series of NFT - I AM MT."
                    .to_string(),
                ip: "I AM MT".to_string(),
                heroes: [
                    "Main Tank".to_string(),
                    "Lady".to_string(),
                    "Hunter".to_string(),
                    "Gul'dan".to_string(),
                ],
                live_scores: false,
                watermark: WatermarkStyle::default(),
            },
            Series::Two => Self {
                series,
                collection: "HashLand NFT".to_string(),
                slug: "hashland-nft".to_string(),
                description: "The NFTs with BTC hashrate have been sold out. Why not and cherish \
                              the last batch of NFTs with HC hashrate? The 2nd batch of Hashland \
                              NFTs with HC hashrate and strong hero attributes in game."
                    .to_string(),
                ip: "Hash Warfare".to_string(),
                heroes: [
                    "Tameka".to_string(),
                    "Katniss".to_string(),
                    "Natalie".to_string(),
                    "Mila".to_string(),
                ],
                live_scores: true,
                watermark: WatermarkStyle::default(),
            },
        }
    }

    /// With a different file stem prefix
    #[inline]
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Hero name of `class`
    #[must_use]
    pub fn hero(&self, class: HeroClass) -> &str {
        &self.heroes[usize::from(class.index() - 1)]
    }
}
