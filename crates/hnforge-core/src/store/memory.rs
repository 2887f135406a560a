use super::{content_digest, public_url, AssetStore, StoredObject};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Object held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// Content type given at write time
    pub content_type: String,
}

/// In-process store, shared by clones
#[derive(Debug, Clone)]
pub struct MemoryStore {
    objects: Arc<DashMap<String, StoredBlob>>,
    base_url: String,
}

impl MemoryStore {
    /// Create empty store with URLs under `memory://`
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url("memory://")
    }

    /// Create empty store with URLs under `base_url`
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            base_url: base_url.into(),
        }
    }

    /// Stored object at `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<StoredBlob> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }

    /// Whether `path` was written
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether nothing was stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Sorted keys
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MemoryStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        let digest = content_digest(&bytes);
        self.objects.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(StoredObject {
            path: path.to_string(),
            url: public_url(&self.base_url, path),
            digest,
        })
    }
}
