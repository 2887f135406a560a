//! Error types for metadata assembly

/// Errors while producing a metadata document
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
