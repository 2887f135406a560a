//! Layered composition
//!
//! Loads every file of a [`RenderPlan`] before drawing anything, so a
//! missing layer fails the image without partial output.

use crate::backend::{Encoding, ImageBackend, RasterBackend};
use crate::error::RenderError;
use crate::layout::{AssetLayout, RenderPlan};
use hnforge_traits::{DerivedProfile, Level};

/// Renders one `(entity, level)` image
///
/// Object-safe seam used by the scheduler; implementations are synchronous
/// and CPU-bound, callers run them on a blocking pool.
pub trait ImageComposer: Send + Sync {
    /// Compose and encode the image for `profile` at `level`
    ///
    /// # Errors
    /// Any missing layer, decode or encode failure
    fn compose(&self, profile: &DerivedProfile, level: Level) -> Result<Vec<u8>, RenderError>;

    /// MIME type of the produced bytes
    fn content_type(&self) -> &'static str;
}

/// Compositor over an [`ImageBackend`]
#[derive(Debug, Clone)]
pub struct Compositor<B = RasterBackend> {
    layout: AssetLayout,
    backend: B,
    encoding: Encoding,
}

impl<B: ImageBackend> Compositor<B> {
    /// Create compositor
    #[must_use]
    pub fn new(layout: AssetLayout, backend: B) -> Self {
        Self {
            layout,
            backend,
            encoding: Encoding::default(),
        }
    }

    /// With encoder settings
    #[inline]
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Asset layout
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &AssetLayout {
        &self.layout
    }

    /// Backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Compose an explicit plan
    ///
    /// # Errors
    /// The first layer that fails to load, or an encoder failure
    pub fn compose_plan(&self, plan: &RenderPlan) -> Result<Vec<u8>, RenderError> {
        let background = self.backend.load(&plan.background)?;
        let layers = plan
            .overlays
            .iter()
            .map(|path| self.backend.load(path))
            .collect::<Result<Vec<_>, _>>()?;

        let composed = layers
            .iter()
            .fold(background, |canvas, layer| self.backend.overlay(canvas, layer));
        let sharpened = self.backend.sharpen(composed);

        self.backend.encode(&sharpened, self.encoding)
    }
}

impl<B: ImageBackend> ImageComposer for Compositor<B> {
    fn compose(&self, profile: &DerivedProfile, level: Level) -> Result<Vec<u8>, RenderError> {
        let plan = self.layout.plan(profile, level)?;
        tracing::debug!(
            entity = %profile.id,
            level = %level,
            layers = plan.overlays.len(),
            "composing"
        );
        self.compose_plan(&plan)
    }

    fn content_type(&self) -> &'static str {
        self.encoding.format.content_type()
    }
}
