//! Error types for image composition

use hnforge_traits::TraitError;
use std::path::PathBuf;

/// Errors during plan construction, layer loading or encoding
///
/// Composition is all-or-nothing: any of these aborts the whole image.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A required layer file does not exist
    #[error("asset missing: {}", .0.display())]
    AssetMissing(PathBuf),

    /// Layer exists but could not be read or decoded
    #[error("failed to decode {}: {message}", path.display())]
    Decode {
        /// Layer path
        path: PathBuf,
        /// Decoder message
        message: String,
    },

    /// Encoding the composed image failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Invalid plan input (level or class)
    #[error("invalid render plan: {0}")]
    Plan(#[from] TraitError),

    /// Item variant missing from the profile
    #[error("profile has no variant for item slot {0}")]
    MissingVariant(u8),
}

impl RenderError {
    /// Create decode error for path
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Path of the offending layer, if any
    #[must_use]
    pub fn layer_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::AssetMissing(path) | Self::Decode { path, .. } => Some(path),
            _ => None,
        }
    }
}
