//! Error types for hnforge-core
//!
//! Covers every failure the regeneration path can hit:
//! - Object store writes ([`StoreError`])
//! - Live attribute reads ([`ReadError`])
//! - One entity level end to end ([`PipelineError`])
//! - WorkSet persistence ([`CheckpointError`])
//! - Configuration loading ([`ConfigError`])
//! - Backfill runs as a whole ([`SchedulerError`])

use hnforge_metadata::MetadataError;
use hnforge_render::RenderError;
use hnforge_traits::{EntityId, Level};
use std::path::PathBuf;

/// Object store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Local filesystem failure
    #[error("store io error at {path}: {source}")]
    Io {
        /// Object path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Non-success HTTP status
    #[error("store returned HTTP {status} for {path}")]
    Http {
        /// Object path
        path: String,
        /// Response status code
        status: u16,
    },

    /// Connection or protocol failure before a status was received
    #[error("store transport error: {0}")]
    Transport(String),

    /// Object refused before any write
    #[error("store rejected {path}: {reason}")]
    Rejected {
        /// Object path
        path: String,
        /// Reason given
        reason: String,
    },
}

/// Live attribute read failure
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Source unreachable
    #[error("attribute source unavailable: {0}")]
    Unavailable(String),

    /// JSON-RPC error object
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Response could not be decoded
    #[error("cannot decode response: {0}")]
    Decode(String),
}

/// Failure of one stage for one entity level
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Composition failed
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// Upload failed
    #[error("upload failed: {0}")]
    Store(#[from] StoreError),

    /// Attribute read failed
    #[error("attribute read failed: {0}")]
    Read(#[from] ReadError),

    /// Document encoding failed
    #[error("metadata failed: {0}")]
    Metadata(#[from] MetadataError),

    /// Blocking-pool task panicked or was cancelled
    #[error("render task aborted: {0}")]
    Join(String),
}

impl PipelineError {
    /// Whether a later attempt may succeed without operator action
    ///
    /// Missing or corrupt layer files need fixing first; network and
    /// scheduling failures usually clear up on their own.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(StoreError::Rejected { .. }) => false,
            Self::Store(_) | Self::Read(_) | Self::Join(_) => true,
            Self::Render(_) | Self::Metadata(_) => false,
        }
    }
}

/// Failure of one level, tagged with the level
#[derive(Debug, thiserror::Error)]
#[error("level {level}: {error}")]
pub struct LevelFailure {
    /// Failing level
    pub level: Level,
    /// Cause
    #[source]
    pub error: PipelineError,
}

/// Failure of a whole entity task
#[derive(Debug, thiserror::Error)]
pub enum EntityFailure {
    /// One or more levels failed
    #[error("entity #{id} failed at {} level(s)", failures.len())]
    Levels {
        /// Entity
        id: EntityId,
        /// Every failing level
        failures: Vec<LevelFailure>,
    },

    /// The task panicked
    #[error("entity #{id} task panicked: {message}")]
    Panicked {
        /// Entity
        id: EntityId,
        /// Panic payload rendered as text
        message: String,
    },
}

impl EntityFailure {
    /// Failed entity
    #[inline]
    #[must_use]
    pub fn id(&self) -> EntityId {
        match self {
            Self::Levels { id, .. } | Self::Panicked { id, .. } => *id,
        }
    }

    /// Whether every cause is transient
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Levels { failures, .. } => failures.iter().all(|f| f.error.is_transient()),
            Self::Panicked { .. } => false,
        }
    }
}

/// WorkSet persistence failure
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Filesystem failure
    #[error("checkpoint io error at {path}: {source}")]
    Io {
        /// Checkpoint file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored record is unreadable
    #[error("corrupt checkpoint {path}: {source}")]
    Corrupt {
        /// Checkpoint file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Stored record belongs to another range
    #[error("checkpoint covers {found}, expected {expected}")]
    RangeMismatch {
        /// Requested range
        expected: String,
        /// Range in the record
        found: String,
    },
}

/// Configuration failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File unreadable
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value outside its allowed domain
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted field name
        field: &'static str,
        /// What is wrong
        reason: String,
    },

    /// Named environment variable is unset
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`]
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Backfill run failure
///
/// Individual entity failures never surface here; they leave the id pending.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Checkpoint could not be loaded or finally saved
    #[error("checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Empty range or zero concurrency
    #[error("invalid backfill request: {0}")]
    InvalidRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let http = PipelineError::Store(StoreError::Http {
            path: "a".into(),
            status: 503,
        });
        assert!(http.is_transient());

        let rejected = PipelineError::Store(StoreError::Rejected {
            path: "a".into(),
            reason: "too large".into(),
        });
        assert!(!rejected.is_transient());

        let missing = PipelineError::Render(RenderError::AssetMissing(PathBuf::from("x.png")));
        assert!(!missing.is_transient());
    }

    #[test]
    fn entity_failure_reports_id_and_levels() {
        let failure = EntityFailure::Levels {
            id: EntityId::new(7),
            failures: vec![LevelFailure {
                level: Level::MIN,
                error: PipelineError::Read(ReadError::Unavailable("down".into())),
            }],
        };
        assert_eq!(failure.id(), EntityId::new(7));
        assert!(failure.is_transient());
        assert_eq!(failure.to_string(), "entity #7 failed at 1 level(s)");
    }
}
