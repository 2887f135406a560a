//! Configuration
//!
//! [`ForgeConfig`] is loaded from TOML. Every section and field has a
//! default, so an empty file is a valid local dry-run configuration.
//!
//! ```toml
//! [collection]
//! series = "two"
//! max_level = 5
//!
//! [render]
//! asset_root = "assets"
//!
//! [scheduler]
//! concurrency = 10
//! checkpoint_dir = "state"
//!
//! [store]
//! kind = "http"
//! endpoint = "https://upload.example.com/bucket"
//! public_base_url = "https://cdn.example.com"
//! prefix = "nft"
//! token_env = "HNFORGE_STORE_TOKEN"
//! ```

use crate::error::ConfigError;
use crate::live::EventFilter;
use crate::pipeline::RegenerationScope;
use crate::scheduler::BackfillOptions;
use crate::source::{Address, ContractCalls, EventRule, RuleKind};
use crate::store::{public_url, AssetPaths};
use hnforge_metadata::SeriesProfile;
use hnforge_render::{Encoding, OutputFormat};
use hnforge_traits::{Series, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Full configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Collection identity
    pub collection: CollectionConfig,
    /// Image rendering
    pub render: RenderConfig,
    /// Backfill scheduling
    pub scheduler: SchedulerConfig,
    /// Live regeneration
    pub live: LiveConfig,
    /// Object store
    pub store: StoreConfig,
    /// Chain access
    pub source: SourceConfig,
}

/// `[collection]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Series selecting layout and texts
    pub series: Series,
    /// File stem prefix; the series default when unset
    pub slug: Option<String>,
    /// Public image prefix used in metadata; derived from the store when unset
    pub image_base_url: Option<String>,
    /// Image file extension in keys and URLs
    pub image_extension: String,
    /// Highest generated level
    pub max_level: u8,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            series: Series::default(),
            slug: None,
            image_base_url: None,
            image_extension: "png".to_string(),
            max_level: MAX_LEVEL,
        }
    }
}

/// `[render]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Root of the layer library
    pub asset_root: PathBuf,
    /// Output container
    pub format: OutputFormat,
    /// Lossy quality, 1-100
    pub quality: u8,
    /// Decoded layers kept in memory
    pub cache_capacity: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let encoding = Encoding::default();
        Self {
            asset_root: PathBuf::from("assets"),
            format: encoding.format,
            quality: encoding.quality,
            cache_capacity: 512,
        }
    }
}

impl RenderConfig {
    /// Encoder settings
    #[inline]
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        Encoding {
            format: self.format,
            quality: self.quality,
        }
    }
}

/// `[scheduler]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Backfill worker count
    pub concurrency: usize,
    /// Dispatches per id per run
    pub max_attempts: u32,
    /// Directory of checkpoint files, one per backfill range
    pub checkpoint_dir: PathBuf,
    /// Completions between checkpoint writes
    pub checkpoint_every: usize,
    /// Artifacts written by backfills
    pub scope: RegenerationScope,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let options = BackfillOptions::default();
        Self {
            concurrency: options.concurrency,
            max_attempts: options.max_attempts,
            checkpoint_dir: PathBuf::from("state"),
            checkpoint_every: options.checkpoint_every,
            scope: options.scope,
        }
    }
}

impl SchedulerConfig {
    /// Backfill options
    #[must_use]
    pub fn options(&self) -> BackfillOptions {
        BackfillOptions {
            concurrency: self.concurrency,
            max_attempts: self.max_attempts,
            checkpoint_every: self.checkpoint_every,
            scope: self.scope,
        }
    }
}

/// `[live]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Events for lower ids are ignored
    pub min_entity_id: u64,
    /// Transfers to this address trigger regeneration
    pub designated_address: Option<Address>,
    /// Artifacts written per event
    pub scope: RegenerationScope,
    /// Concurrent live regenerations
    pub concurrency: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            min_entity_id: 0,
            designated_address: None,
            scope: RegenerationScope::Full,
            concurrency: 4,
        }
    }
}

impl LiveConfig {
    /// Event filter
    #[must_use]
    pub fn filter(&self) -> EventFilter {
        EventFilter {
            min_entity_id: self.min_entity_id,
            designated: self.designated_address,
        }
    }
}

/// Store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Discarded at exit
    Memory,
    /// Local directory
    #[default]
    Fs,
    /// HTTP PUT
    Http,
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend
    pub kind: StoreKind,
    /// Root directory for `fs`
    pub root: PathBuf,
    /// Upload endpoint for `http`
    pub endpoint: Option<String>,
    /// URL objects are served from
    pub public_base_url: Option<String>,
    /// Key prefix
    pub prefix: String,
    /// Environment variable holding the bearer token
    pub token_env: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Fs,
            root: PathBuf::from("out"),
            endpoint: None,
            public_base_url: None,
            prefix: String::new(),
            token_env: None,
        }
    }
}

impl StoreConfig {
    /// Bearer token from the configured environment variable
    ///
    /// # Errors
    /// `MissingEnv` when a variable is named but unset
    pub fn token(&self) -> Result<Option<String>, ConfigError> {
        match &self.token_env {
            None => Ok(None),
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ConfigError::MissingEnv(var.clone())),
        }
    }

    /// Base URL objects are served from
    #[must_use]
    pub fn serving_base_url(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }
        match self.kind {
            StoreKind::Memory => "memory://".to_string(),
            StoreKind::Fs => format!("file://{}", self.root.display()),
            StoreKind::Http => self.endpoint.clone().unwrap_or_default(),
        }
    }
}

/// `[source]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON-RPC endpoint; live attributes default to zero when unset
    pub rpc_url: Option<String>,
    /// Entity contract
    pub contract: Option<Address>,
    /// Read function signatures
    pub calls: ContractCalls,
    /// Seconds between log polls
    pub poll_interval_secs: u64,
    /// First block to scan; the head when unset
    pub start_block: Option<u64>,
    /// Blocks per log request
    pub max_block_span: u64,
    /// Event rules
    pub events: Vec<EventRule>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract: None,
            calls: ContractCalls::default(),
            poll_interval_secs: 5,
            start_block: None,
            max_block_span: 2_000,
            events: EventRule::defaults(),
        }
    }
}

impl SourceConfig {
    /// Poll interval
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl ForgeConfig {
    /// Parse and validate TOML
    ///
    /// # Errors
    /// `Parse` on syntax or schema errors, `Invalid` on out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `Io` when unreadable, otherwise as [`ForgeConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With series
    #[inline]
    #[must_use]
    pub fn with_series(mut self, series: Series) -> Self {
        self.collection.series = series;
        self
    }

    /// With layer library root
    #[inline]
    #[must_use]
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.render.asset_root = root.into();
        self
    }

    /// With backfill concurrency
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.scheduler.concurrency = concurrency;
        self
    }

    /// With store backend
    #[inline]
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Check value domains and cross-field requirements
    ///
    /// # Errors
    /// The first `ConfigError::Invalid` found
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.collection;
        if !(1..=MAX_LEVEL).contains(&c.max_level) {
            return Err(ConfigError::invalid(
                "collection.max_level",
                format!("must be within 1..={MAX_LEVEL}, got {}", c.max_level),
            ));
        }
        if c.image_extension.is_empty()
            || !c.image_extension.chars().all(|ch| ch.is_ascii_alphanumeric())
        {
            return Err(ConfigError::invalid(
                "collection.image_extension",
                format!("must be alphanumeric, got {:?}", c.image_extension),
            ));
        }
        if !(1..=100).contains(&self.render.quality) {
            return Err(ConfigError::invalid("render.quality", "must be within 1..=100"));
        }
        if self.scheduler.concurrency == 0 {
            return Err(ConfigError::invalid("scheduler.concurrency", "must be at least 1"));
        }
        if self.scheduler.max_attempts == 0 {
            return Err(ConfigError::invalid("scheduler.max_attempts", "must be at least 1"));
        }
        if self.scheduler.checkpoint_every == 0 {
            return Err(ConfigError::invalid(
                "scheduler.checkpoint_every",
                "must be at least 1",
            ));
        }
        if self.scheduler.checkpoint_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "scheduler.checkpoint_dir",
                "must name a directory",
            ));
        }
        if self.live.concurrency == 0 {
            return Err(ConfigError::invalid("live.concurrency", "must be at least 1"));
        }
        if self.store.kind == StoreKind::Http {
            if self.store.endpoint.is_none() {
                return Err(ConfigError::invalid("store.endpoint", "required for http store"));
            }
            if self.store.public_base_url.is_none() {
                return Err(ConfigError::invalid(
                    "store.public_base_url",
                    "required for http store",
                ));
            }
        }
        if let Some(rule) = self
            .source
            .events
            .iter()
            .find(|r| r.kind == RuleKind::Transfer && r.recipient.is_none())
        {
            return Err(ConfigError::invalid(
                "source.events",
                format!("transfer rule {} needs a recipient location", rule.signature),
            ));
        }
        Ok(())
    }

    /// Series text with the configured slug applied
    #[must_use]
    pub fn series_profile(&self) -> SeriesProfile {
        let profile = SeriesProfile::for_series(self.collection.series);
        match &self.collection.slug {
            Some(slug) => profile.with_slug(slug.clone()),
            None => profile,
        }
    }

    /// Object key layout
    #[must_use]
    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths::new(
            self.series_profile().slug,
            self.collection.image_extension.clone(),
        )
        .with_prefix(self.store.prefix.clone())
    }

    /// Image URL prefix written into metadata
    #[must_use]
    pub fn image_base_url(&self) -> String {
        self.collection.image_base_url.clone().unwrap_or_else(|| {
            public_url(&self.store.serving_base_url(), &self.asset_paths().image_dir())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_valid_with_defaults() {
        let config = ForgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ForgeConfig::default());
        assert_eq!(config.collection.series, Series::Two);
        assert_eq!(config.scheduler.options(), BackfillOptions::default());
        assert_eq!(config.source.events.len(), 3);
        assert_eq!(config.scheduler.checkpoint_dir, Path::new("state"));
    }

    #[test]
    fn full_config_parses() {
        let config = ForgeConfig::from_toml_str(
            r#"
            [collection]
            series = "basic"
            slug = "hn"
            max_level = 3

            [render]
            asset_root = "/srv/layers"
            format = "png"

            [scheduler]
            concurrency = 3
            max_attempts = 2
            checkpoint_dir = "/var/lib/hnforge"

            [live]
            min_entity_id = 60000
            designated_address = "0xe0A9e5B59701a776575fDd6257c3F89Ae362629a"
            scope = "metadata_only"

            [store]
            kind = "http"
            endpoint = "https://upload.example.com/b"
            public_base_url = "https://cdn.example.com"
            prefix = "nft"

            [source]
            rpc_url = "https://rpc.example.com"
            poll_interval_secs = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.collection.series, Series::Basic);
        assert_eq!(config.render.encoding().format, OutputFormat::Png);
        assert_eq!(config.scheduler.options().max_attempts, 2);
        assert_eq!(config.scheduler.checkpoint_dir, Path::new("/var/lib/hnforge"));
        assert_eq!(config.live.scope, RegenerationScope::MetadataOnly);
        assert_eq!(config.live.filter().min_entity_id, 60_000);
        assert_eq!(config.source.poll_interval(), Duration::from_secs(12));
        assert_eq!(config.image_base_url(), "https://cdn.example.com/nft/images");
        assert_eq!(
            config.asset_paths().metadata(
                hnforge_traits::EntityId::new(9),
                hnforge_traits::Level::MIN
            ),
            "nft/metadata/hn-9-1.json"
        );
    }

    #[test]
    fn explicit_image_base_url_wins() {
        let mut config = ForgeConfig::default();
        config.collection.image_base_url = Some("https://img.example.com".into());
        assert_eq!(config.image_base_url(), "https://img.example.com");
    }

    #[test]
    fn invalid_values_are_named() {
        let cases = [
            ("[collection]\nmax_level = 6", "collection.max_level"),
            ("[collection]\nimage_extension = \"p/g\"", "collection.image_extension"),
            ("[render]\nquality = 0", "render.quality"),
            ("[scheduler]\nconcurrency = 0", "scheduler.concurrency"),
            ("[scheduler]\ncheckpoint_dir = \"\"", "scheduler.checkpoint_dir"),
            ("[store]\nkind = \"http\"", "store.endpoint"),
        ];
        for (text, field) in cases {
            match ForgeConfig::from_toml_str(text) {
                Err(ConfigError::Invalid { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{text}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_series_is_a_parse_error() {
        let err = ForgeConfig::from_toml_str("[collection]\nseries = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn token_comes_from_named_variable() {
        let mut store = StoreConfig::default();
        assert_eq!(store.token().unwrap(), None);

        store.token_env = Some("HNFORGE_TEST_TOKEN_UNSET_4711".into());
        assert!(matches!(store.token(), Err(ConfigError::MissingEnv(_))));

        std::env::set_var("HNFORGE_TEST_TOKEN_SET_4711", "secret");
        store.token_env = Some("HNFORGE_TEST_TOKEN_SET_4711".into());
        assert_eq!(store.token().unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ForgeConfig::load("/definitely/not/hnforge.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
