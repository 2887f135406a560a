use super::{content_digest, public_url, AssetStore, StoredObject};
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local directory store, for dry runs and self-hosting
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written object.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl FsStore {
    /// Create store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// With public base URL; defaults to `file://` URLs
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StoreError::Rejected {
                path: path.to_string(),
                reason: "path must be relative and stay inside the store root".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStore for FsStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        let target = self.resolve(path)?;
        let io = |source| StoreError::Io {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }
        let digest = content_digest(&bytes);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = target.with_extension(format!("{}-{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, &bytes).await.map_err(io)?;
        tokio::fs::rename(&tmp, &target).await.map_err(io)?;

        let url = match &self.base_url {
            Some(base) => public_url(base, path),
            None => format!("file://{}", target.display()),
        };
        Ok(StoredObject {
            path: path.to_string(),
            url,
            digest,
        })
    }
}
