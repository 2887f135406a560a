//! Metadata document schema
//!
//! Field names are fixed for marketplace compatibility:
//! `{name, description, image, attributes: [{trait_type, value}]}`.

use crate::error::MetadataError;
use serde::{Deserialize, Serialize};

/// Attribute value: text, number or boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Boolean trait
    Bool(bool),
    /// Integer trait
    Number(u64),
    /// Text trait
    Text(String),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One `{trait_type, value}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Trait key
    pub trait_type: String,
    /// Trait value
    pub value: AttributeValue,
}

impl Attribute {
    /// Create attribute
    #[inline]
    pub fn new(trait_type: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Metadata for one `(entity, level)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Display name, always embeds the entity id
    pub name: String,
    /// Series description
    pub description: String,
    /// Image URL, possibly with image-processing directives
    pub image: String,
    /// Ordered attribute list
    pub attributes: Vec<Attribute>,
}

impl MetadataDocument {
    /// Look up an attribute by key
    #[must_use]
    pub fn attribute(&self, trait_type: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }

    /// Compact JSON bytes, as uploaded
    ///
    /// # Errors
    /// Returns `MetadataError::Serialize` if encoding fails
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, MetadataError> {
        Ok(serde_json::to_vec(self)?)
    }
}
