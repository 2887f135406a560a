//! hnforge-metadata - per-level metadata documents
//!
//! - [`MetadataDocument`]: the uploaded JSON schema
//! - [`SeriesProfile`]: fixed text per series
//! - [`MetadataAssembler`]: derived traits + [`DynamicAttributes`] -> document

pub mod assembler;
pub mod document;
pub mod error;
pub mod series;

pub use assembler::{file_stem, format_score, DynamicAttributes, MetadataAssembler, SCORE_SCALE};
pub use document::{Attribute, AttributeValue, MetadataDocument};
pub use error::MetadataError;
pub use series::{SeriesProfile, WatermarkStyle};
