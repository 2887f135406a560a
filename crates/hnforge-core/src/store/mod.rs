//! Object storage for generated artifacts
//!
//! - [`AssetStore`]: `put(path, bytes, content_type)` returning the public URL
//! - [`AssetPaths`]: the fixed image/metadata key layout
//! - [`MemoryStore`], [`FsStore`], [`HttpStore`]: in-process, local dry-run
//!   and HTTP PUT backends

mod fs;
mod http;
mod memory;

pub use fs::FsStore;
pub use http::HttpStore;
pub use memory::{MemoryStore, StoredBlob};

use crate::error::StoreError;
use async_trait::async_trait;
use hnforge_metadata::file_stem;
use hnforge_traits::{EntityId, Level};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content type of metadata documents
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Result of a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Object key
    pub path: String,
    /// Public URL of the object
    pub url: String,
    /// SHA-256 of the stored bytes, lowercase hex
    pub digest: String,
}

/// Writes named binary objects
///
/// Writing the same path twice overwrites; last write wins.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `path`
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StoreError>;
}

/// SHA-256 hex digest of `bytes`
#[must_use]
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Join a public base URL and an object key
#[must_use]
pub fn public_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Key layout of generated objects
///
/// `{prefix}images/{slug}-{id}-{level}.{ext}` and
/// `{prefix}metadata/{slug}-{id}-{level}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPaths {
    prefix: String,
    slug: String,
    image_extension: String,
}

impl AssetPaths {
    /// Create layout for `slug` with `image_extension`
    #[must_use]
    pub fn new(slug: impl Into<String>, image_extension: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            slug: slug.into(),
            image_extension: image_extension.into(),
        }
    }

    /// With key prefix, normalised to end in `/` when non-empty
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_matches('/');
        self.prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}/")
        };
        self
    }

    /// Image key
    #[must_use]
    pub fn image(&self, id: EntityId, level: Level) -> String {
        format!(
            "{}images/{}.{}",
            self.prefix,
            file_stem(&self.slug, id, level),
            self.image_extension
        )
    }

    /// Metadata key
    #[must_use]
    pub fn metadata(&self, id: EntityId, level: Level) -> String {
        format!("{}metadata/{}.json", self.prefix, file_stem(&self.slug, id, level))
    }

    /// Key prefix of images, used to derive the public image base URL
    #[must_use]
    pub fn image_dir(&self) -> String {
        format!("{}images", self.prefix)
    }
}
