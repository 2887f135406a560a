//! Metadata assembly
//!
//! Combines the static, derived part of an entity (class, level) with the
//! live attributes read from the chain at assembly time. Nothing here is
//! cached: two calls straddling an on-chain change produce different
//! documents, identical inputs produce byte-identical ones.

use crate::document::{Attribute, MetadataDocument};
use crate::series::{SeriesProfile, WatermarkStyle};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hnforge_traits::{EntityId, HeroClass, Level};
use serde::{Deserialize, Serialize};

/// On-chain scores are stored scaled by this factor
pub const SCORE_SCALE: u64 = 10_000;

/// Live, entity-scoped attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicAttributes {
    /// Raw scores `[hc, btc]`, scaled by [`SCORE_SCALE`]
    pub scores: [u64; 2],
    /// Ultra badge flag
    pub ultra: bool,
    /// Optional display name overriding the collection prefix
    pub name: Option<String>,
}

impl DynamicAttributes {
    /// Create with scores
    #[inline]
    #[must_use]
    pub fn new(hc: u64, btc: u64) -> Self {
        Self {
            scores: [hc, btc],
            ..Self::default()
        }
    }

    /// With ultra flag
    #[inline]
    #[must_use]
    pub fn with_ultra(mut self, ultra: bool) -> Self {
        self.ultra = ultra;
        self
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Format a scaled score with exactly four decimals
///
/// Integer arithmetic only, so the output is exact for every input.
#[must_use]
pub fn format_score(raw: u64) -> String {
    format!("{}.{:04}", raw / SCORE_SCALE, raw % SCORE_SCALE)
}

/// File stem shared by the image and metadata objects
#[must_use]
pub fn file_stem(slug: &str, id: EntityId, level: Level) -> String {
    format!("{slug}-{id}-{level}")
}

/// Builds [`MetadataDocument`]s for one series
#[derive(Debug, Clone)]
pub struct MetadataAssembler {
    profile: SeriesProfile,
    image_base_url: String,
    image_extension: String,
}

impl MetadataAssembler {
    /// Create assembler
    ///
    /// `image_base_url` is the public prefix images are served from.
    #[must_use]
    pub fn new(profile: SeriesProfile, image_base_url: impl Into<String>) -> Self {
        Self {
            profile,
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
            image_extension: "png".to_string(),
        }
    }

    /// With image file extension used in URLs
    #[inline]
    #[must_use]
    pub fn with_image_extension(mut self, ext: impl Into<String>) -> Self {
        self.image_extension = ext.into();
        self
    }

    /// Series profile
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &SeriesProfile {
        &self.profile
    }

    /// Assemble the document for `(id, level)`
    #[must_use]
    pub fn assemble(
        &self,
        id: EntityId,
        level: Level,
        class: HeroClass,
        dynamic: &DynamicAttributes,
    ) -> MetadataDocument {
        let profile = &self.profile;
        let prefix = dynamic
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&profile.collection);

        let mut image = format!(
            "{}/{}.{}",
            self.image_base_url,
            file_stem(&profile.slug, id, level),
            self.image_extension
        );

        let mut attributes = vec![
            Attribute::new("Ip", profile.ip.as_str()),
            Attribute::new("Series", profile.series.label()),
            Attribute::new("Level", u64::from(level.get())),
            Attribute::new("Class", class.name()),
            Attribute::new("Hero", profile.hero(class)),
        ];

        if profile.live_scores {
            image.push_str(&image_process(&profile.watermark, dynamic));
            attributes.push(Attribute::new("HC_Hashrate", format_score(dynamic.scores[0])));
            attributes.push(Attribute::new("BTC_Hashrate", format_score(dynamic.scores[1])));
            if dynamic.ultra {
                attributes.push(Attribute::new("Ultra", true));
            }
        }

        MetadataDocument {
            name: format!("{prefix} #{id}"),
            description: profile.description.clone(),
            image,
            attributes,
        }
    }
}

/// `?image_process=` query drawing the HC score and the optional ultra logo
fn image_process(style: &WatermarkStyle, dynamic: &DynamicAttributes) -> String {
    let score = URL_SAFE_NO_PAD.encode(format_score(dynamic.scores[0]));
    let mut query = format!(
        "?image_process=watermark,text_{score},type_{},color_{},size_{},g_{},x_{},y_{}",
        style.font, style.color, style.size, style.gravity, style.x, style.y
    );
    if dynamic.ultra {
        let logo = URL_SAFE_NO_PAD.encode(&style.ultra_logo_url);
        query.push_str(&format!("/watermark,image_{logo},g_center"));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_formatting_is_exact() {
        assert_eq!(format_score(0), "0.0000");
        assert_eq!(format_score(12_345), "1.2345");
        assert_eq!(format_score(120_005), "12.0005");
        assert_eq!(format_score(7), "0.0007");
    }

    #[test]
    fn image_process_without_ultra() {
        let q = image_process(&WatermarkStyle::default(), &DynamicAttributes::new(12_345, 0));
        assert_eq!(
            q,
            "?image_process=watermark,text_MS4yMzQ1,type_enpnZnhpbmd5YW4,color_ffffff,size_24,g_nw,x_395,y_79"
        );
    }

    #[test]
    fn image_process_with_ultra_logo() {
        let q = image_process(
            &WatermarkStyle::default(),
            &DynamicAttributes::new(0, 0).with_ultra(true),
        );
        assert!(q.starts_with("?image_process=watermark,text_MC4wMDAw,"));
        assert!(q.ends_with(
            "/watermark,image_aHR0cHM6Ly9jZG4uaGFzaGxhbmQuY29tL25mdC9sb2dvL3VsdHJhXzEwMjQucG5n,g_center"
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let assembler = MetadataAssembler::new(
            SeriesProfile::for_series(hnforge_traits::Series::Basic),
            "https://cdn.example.com/images/",
        );
        let doc = assembler.assemble(
            EntityId::new(1),
            Level::MIN,
            HeroClass::Holy,
            &DynamicAttributes::default(),
        );
        assert_eq!(doc.image, "https://cdn.example.com/images/hashland-nft-1-1.png");
    }
}
