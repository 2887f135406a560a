//! Per-entity regeneration
//!
//! One entity task derives the static profile once, then runs every level
//! `1..=max_level` concurrently. A level is: compose on the blocking pool,
//! upload the image, read fresh live attributes, assemble and upload the
//! metadata. The task succeeds only when every level succeeds.

use crate::error::{EntityFailure, LevelFailure, PipelineError};
use crate::source::AttributeSource;
use crate::store::{AssetPaths, AssetStore, StoredObject, JSON_CONTENT_TYPE};
use async_trait::async_trait;
use futures::future::join_all;
use hnforge_metadata::MetadataAssembler;
use hnforge_render::ImageComposer;
use hnforge_traits::{DerivedProfile, EntityId, HeroClass, Level, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Which artifacts a regeneration writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationScope {
    /// Image and metadata for every level
    #[default]
    Full,
    /// Metadata only; images are left as they are
    MetadataOnly,
}

/// Objects written for one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReport {
    /// Level
    pub level: Level,
    /// Image, absent for metadata-only runs
    pub image: Option<StoredObject>,
    /// Metadata document
    pub metadata: StoredObject,
}

/// Objects written for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReport {
    /// Entity
    pub id: EntityId,
    /// Derived class
    pub class: HeroClass,
    /// One entry per level, ascending
    pub levels: Vec<LevelReport>,
}

/// Regenerates all artifacts of one entity
///
/// Seam between the schedulers and the pipeline.
#[async_trait]
pub trait EntityRegenerator: Send + Sync {
    /// Regenerate `id` within `scope`
    async fn regenerate(
        &self,
        id: EntityId,
        scope: RegenerationScope,
    ) -> Result<EntityReport, EntityFailure>;
}

/// Default [`EntityRegenerator`]: compose, assemble, upload
pub struct EntityPipeline {
    composer: Arc<dyn ImageComposer>,
    assembler: MetadataAssembler,
    source: Arc<dyn AttributeSource>,
    store: Arc<dyn AssetStore>,
    paths: AssetPaths,
    max_level: u8,
}

impl EntityPipeline {
    /// Create pipeline
    #[must_use]
    pub fn new(
        composer: Arc<dyn ImageComposer>,
        assembler: MetadataAssembler,
        source: Arc<dyn AttributeSource>,
        store: Arc<dyn AssetStore>,
        paths: AssetPaths,
    ) -> Self {
        Self {
            composer,
            assembler,
            source,
            store,
            paths,
            max_level: MAX_LEVEL,
        }
    }

    /// With highest level to generate, clamped to `1..=MAX_LEVEL`
    #[inline]
    #[must_use]
    pub fn with_max_level(mut self, max_level: u8) -> Self {
        self.max_level = max_level.clamp(1, MAX_LEVEL);
        self
    }

    /// Object key layout
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &AssetPaths {
        &self.paths
    }

    /// Highest generated level
    #[inline]
    #[must_use]
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    async fn regenerate_level(
        &self,
        profile: DerivedProfile,
        level: Level,
        scope: RegenerationScope,
    ) -> Result<LevelReport, PipelineError> {
        let id = profile.id;

        let image = match scope {
            RegenerationScope::Full => {
                let composer = Arc::clone(&self.composer);
                let bytes = tokio::task::spawn_blocking(move || composer.compose(&profile, level))
                    .await
                    .map_err(|e| PipelineError::Join(e.to_string()))??;
                let stored = self
                    .store
                    .put(&self.paths.image(id, level), bytes, self.composer.content_type())
                    .await?;
                debug!(entity = %id, %level, url = %stored.url, "image uploaded");
                Some(stored)
            }
            RegenerationScope::MetadataOnly => None,
        };

        let dynamic = self.source.attributes(id).await?;
        let document = self.assembler.assemble(id, level, profile.class, &dynamic);
        let metadata = self
            .store
            .put(
                &self.paths.metadata(id, level),
                document.to_json_bytes()?,
                JSON_CONTENT_TYPE,
            )
            .await?;
        debug!(entity = %id, %level, url = %metadata.url, "metadata uploaded");

        Ok(LevelReport {
            level,
            image,
            metadata,
        })
    }
}

#[async_trait]
impl EntityRegenerator for EntityPipeline {
    #[instrument(skip(self), fields(entity = %id))]
    async fn regenerate(
        &self,
        id: EntityId,
        scope: RegenerationScope,
    ) -> Result<EntityReport, EntityFailure> {
        let profile = DerivedProfile::derive(id);

        let outcomes = join_all(Level::up_to(self.max_level).map(|level| async move {
            (level, self.regenerate_level(profile, level, scope).await)
        }))
        .await;

        let mut levels = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (level, outcome) in outcomes {
            match outcome {
                Ok(report) => levels.push(report),
                Err(error) => failures.push(LevelFailure { level, error }),
            }
        }

        if failures.is_empty() {
            Ok(EntityReport {
                id,
                class: profile.class,
                levels,
            })
        } else {
            Err(EntityFailure::Levels { id, failures })
        }
    }
}
