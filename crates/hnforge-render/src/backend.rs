//! Image-processing capability
//!
//! [`ImageBackend`] is the seam between composition order (owned by this
//! crate) and pixel operations (owned by an imaging library). The default
//! [`RasterBackend`] runs on the `image` crate and keeps decoded layers in a
//! bounded cache: a collection renders tens of thousands of images from a few
//! hundred distinct layer files.

use crate::error::RenderError;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader, RgbaImage};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG at the configured quality
    #[default]
    Jpeg,
    /// Lossless PNG (quality ignored)
    Png,
}

impl OutputFormat {
    /// MIME type of the encoded bytes
    #[inline]
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    /// Container format
    pub format: OutputFormat,
    /// Lossy quality, 1-100
    pub quality: u8,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 90,
        }
    }
}

/// Pixel operations needed by the compositor
pub trait ImageBackend: Send + Sync {
    /// Decoded image handle
    type Handle: Clone + Send;

    /// Load and decode an image file
    ///
    /// # Errors
    /// `RenderError::AssetMissing` when absent, `RenderError::Decode` when
    /// unreadable
    fn load(&self, path: &Path) -> Result<Self::Handle, RenderError>;

    /// Draw `top` over `base` at the origin
    fn overlay(&self, base: Self::Handle, top: &Self::Handle) -> Self::Handle;

    /// Apply the sharpening pass
    fn sharpen(&self, image: Self::Handle) -> Self::Handle;

    /// Encode to bytes
    ///
    /// # Errors
    /// Returns `RenderError::Encode` if the encoder rejects the image
    fn encode(&self, image: &Self::Handle, encoding: Encoding) -> Result<Vec<u8>, RenderError>;
}

/// Unsharp-mask parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sharpen {
    /// Gaussian blur sigma
    pub sigma: f32,
    /// Minimum brightness difference to sharpen
    pub threshold: i32,
}

impl Default for Sharpen {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            threshold: 0,
        }
    }
}

/// `image`-crate backend with a decoded-layer cache
#[derive(Debug, Clone)]
pub struct RasterBackend {
    cache: Cache<PathBuf, Arc<RgbaImage>>,
    sharpen: Sharpen,
}

impl RasterBackend {
    /// Create backend caching up to `cache_capacity` decoded layers
    #[must_use]
    pub fn new(cache_capacity: u64) -> Self {
        Self {
            cache: Cache::new(cache_capacity),
            sharpen: Sharpen::default(),
        }
    }

    /// With sharpening parameters
    #[inline]
    #[must_use]
    pub fn with_sharpen(mut self, sharpen: Sharpen) -> Self {
        self.sharpen = sharpen;
        self
    }

    /// Number of cached layers
    #[must_use]
    pub fn cached_layers(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    fn decode(path: &Path) -> Result<RgbaImage, RenderError> {
        let reader = ImageReader::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RenderError::AssetMissing(path.to_path_buf()),
            _ => RenderError::decode(path, e),
        })?;
        let image = reader
            .with_guessed_format()
            .map_err(|e| RenderError::decode(path, e))?
            .decode()
            .map_err(|e| RenderError::decode(path, e))?;
        Ok(image.to_rgba8())
    }
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new(512)
    }
}

impl ImageBackend for RasterBackend {
    type Handle = Arc<RgbaImage>;

    fn load(&self, path: &Path) -> Result<Self::Handle, RenderError> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(hit);
        }
        let decoded = Arc::new(Self::decode(path)?);
        self.cache.insert(path.to_path_buf(), Arc::clone(&decoded));
        tracing::trace!(path = %path.display(), "layer decoded");
        Ok(decoded)
    }

    fn overlay(&self, base: Self::Handle, top: &Self::Handle) -> Self::Handle {
        let mut canvas = Arc::try_unwrap(base).unwrap_or_else(|shared| (*shared).clone());
        image::imageops::overlay(&mut canvas, top.as_ref(), 0, 0);
        Arc::new(canvas)
    }

    fn sharpen(&self, image: Self::Handle) -> Self::Handle {
        Arc::new(image::imageops::unsharpen(
            image.as_ref(),
            self.sharpen.sigma,
            self.sharpen.threshold,
        ))
    }

    fn encode(&self, image: &Self::Handle, encoding: Encoding) -> Result<Vec<u8>, RenderError> {
        let mut out = Vec::new();
        let dynamic = DynamicImage::ImageRgba8(image.as_ref().clone());
        let result = match encoding.format {
            OutputFormat::Jpeg => {
                let quality = encoding.quality.clamp(1, 100);
                // JPEG carries no alpha channel
                DynamicImage::ImageRgb8(dynamic.to_rgb8())
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))
            }
            OutputFormat::Png => dynamic.write_with_encoder(PngEncoder::new(&mut out)),
        };
        result.map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(out)
    }
}
