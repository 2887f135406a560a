//! Seeded trait derivation
//!
//! Every derived trait is a pure function of `(EntityId, TraitSlot)`:
//!
//! ```text
//! seed  = keccak256(uint256_be(id) || utf8(slot))
//! value = (seed as u256 big-endian) mod range + base
//! ```
//!
//! This is Solidity's `keccak256(abi.encodePacked(uint256, string))`, so the
//! same value can be recomputed on-chain or by any other tool. Hash function,
//! packing and byte order are fixed.

use crate::slot::TraitSlot;
use crate::types::EntityId;
use sha3::{Digest, Keccak256};
use std::num::NonZeroU64;

/// Keccak-256 of arbitrary bytes
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of `keccak256(signature)`
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Packed hash input for `(id, slot)`
#[must_use]
pub fn encode_packed(id: EntityId, slot: &TraitSlot) -> Vec<u8> {
    let tag = slot.tag();
    let mut packed = Vec::with_capacity(32 + tag.len());
    packed.extend_from_slice(&id.to_uint256());
    packed.extend_from_slice(tag.as_bytes());
    packed
}

/// Seed hash for `(id, slot)`
#[inline]
#[must_use]
pub fn seed(id: EntityId, slot: &TraitSlot) -> [u8; 32] {
    keccak256(&encode_packed(id, slot))
}

/// Seed hash as lowercase hex
#[must_use]
pub fn seed_hex(id: EntityId, slot: &TraitSlot) -> String {
    hex::encode(seed(id, slot))
}

/// Derive a bounded integer in `[base, base + range)`
///
/// Total for every input: the sum wraps when `base + range` exceeds
/// `u64::MAX`.
#[must_use]
pub fn derive(id: EntityId, slot: &TraitSlot, base: u64, range: NonZeroU64) -> u64 {
    base.wrapping_add(reduce_be(&seed(id, slot), range.get()))
}

/// Reduce a big-endian unsigned integer modulo `modulus`
fn reduce_be(bytes: &[u8], modulus: u64) -> u64 {
    let m = u128::from(modulus);
    let rem = bytes
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | u128::from(*byte)) % m);
    // rem < modulus, which fits u64
    u64::try_from(rem).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn derive_wraps_near_u64_max() {
        let id = EntityId::new(42);
        let offset = derive(id, &TraitSlot::Class, 0, nz(4));
        let high = derive(id, &TraitSlot::Class, u64::MAX - 1, nz(4));
        assert_eq!(high, (u64::MAX - 1).wrapping_add(offset));
    }

    #[test]
    fn keccak_empty_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn selector_matches_erc20_transfer() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn packed_layout() {
        let packed = encode_packed(EntityId::new(42), &TraitSlot::Class);
        assert_eq!(packed.len(), 37);
        assert_eq!(packed[31], 42);
        assert_eq!(&packed[32..], b"class");
    }

    #[test]
    fn seed_vector_for_entity_42() {
        assert_eq!(
            seed_hex(EntityId::new(42), &TraitSlot::Class),
            "28f8420084e0b3bdcd0e411e3271a5660f105bfb3c0af53d2a0b6c6cefd333a3"
        );
    }

    #[test]
    fn reduce_matches_small_values() {
        assert_eq!(reduce_be(&[0x01, 0x00], 7), 256 % 7);
        assert_eq!(reduce_be(&[0xff; 32], 1), 0);
    }

    #[test]
    fn range_one_is_constant() {
        for id in 0..50 {
            assert_eq!(derive(EntityId::new(id), &TraitSlot::Item(1), 3, nz(1)), 3);
        }
    }
}
