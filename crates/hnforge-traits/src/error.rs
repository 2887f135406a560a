//! Error types for trait derivation and layer selection

/// Errors raised when validating trait inputs
///
/// Derivation itself is total and never fails; these cover the typed
/// wrappers around its inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraitError {
    /// Level outside the rendered range
    #[error("level {level} out of range (expected 1..={max})")]
    LevelOutOfRange {
        /// Requested level
        level: u8,
        /// Highest supported level
        max: u8,
    },

    /// Class index outside `1..=4`
    #[error("invalid class index: {0}")]
    InvalidClass(u64),

    /// Unrecognised trait slot tag
    #[error("unknown trait slot: '{0}'")]
    UnknownSlot(String),

    /// Unrecognised series name
    #[error("unknown series: '{0}'")]
    UnknownSeries(String),
}
