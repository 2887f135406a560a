//! Live attribute reads and entity change notifications
//!
//! - [`AttributeSource`]: per-entity live attributes, read fresh every time
//! - [`EntityEvent`]: "this entity changed" notifications consumed by the
//!   live regenerator
//! - [`rpc`]: Ethereum JSON-RPC implementations of both

pub mod abi;
pub mod events;
pub mod rpc;

use crate::error::ReadError;
use async_trait::async_trait;
use hnforge_metadata::DynamicAttributes;
use hnforge_traits::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

pub use events::{EventRule, IdLocation, RpcEventPoller, RuleKind};
pub use rpc::{ContractCalls, RpcAttributeSource, RpcClient};

/// Reads live, entity-scoped attributes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeSource: Send + Sync {
    /// Current scores, ultra flag and display name of `id`
    async fn attributes(&self, id: EntityId) -> Result<DynamicAttributes, ReadError>;

    /// Current level of `id`
    async fn level(&self, id: EntityId) -> Result<u8, ReadError>;
}

/// Source used when no chain endpoint is configured
///
/// Attributes read as zero scores without the ultra flag; levels are
/// unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

#[async_trait]
impl AttributeSource for NullSource {
    async fn attributes(&self, _id: EntityId) -> Result<DynamicAttributes, ReadError> {
        Ok(DynamicAttributes::default())
    }

    async fn level(&self, id: EntityId) -> Result<u8, ReadError> {
        Err(ReadError::Unavailable(format!(
            "no attribute source configured, cannot read level of #{id}"
        )))
    }
}

/// 20-byte account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Right-aligned 20 bytes of an ABI word
    #[must_use]
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits).map_err(|e| format!("invalid address {s}: {e}"))?;
        let bytes: [u8; 20] = raw
            .try_into()
            .map_err(|_| format!("invalid address {s}: expected 20 bytes"))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// What happened to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Minted
    Created,
    /// Live attributes changed
    AttributesChanged,
    /// Ownership moved to the given address
    TransferredTo(Address),
}

/// Change notification for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityEvent {
    /// Affected entity
    pub id: EntityId,
    /// Change kind
    pub kind: EventKind,
}

impl EntityEvent {
    /// Create event
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<EntityId>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_mixed_case_and_prints_lowercase() {
        let a: Address = "0xe0A9e5B59701a776575fDd6257c3F89Ae362629a".parse().unwrap();
        assert_eq!(a.to_string(), "0xe0a9e5b59701a776575fdd6257c3f89ae362629a");
        let b: Address = "e0a9e5b59701a776575fdd6257c3f89ae362629a".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn address_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[tokio::test]
    async fn null_source_reads_zero_and_no_level() {
        let attrs = NullSource.attributes(EntityId::new(1)).await.unwrap();
        assert_eq!(attrs, DynamicAttributes::default());
        assert!(matches!(
            NullSource.level(EntityId::new(1)).await,
            Err(ReadError::Unavailable(_))
        ));
    }

    #[test]
    fn address_from_word_takes_low_bytes() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0xab; 20]);
        assert_eq!(Address::from_word(&word), Address([0xab; 20]));
    }
}
