//! Minimal contract ABI codec
//!
//! Covers the shapes the attribute reads need: `uint256` and `string`
//! arguments, `uint256` and `uint256[]` results, plus JSON-RPC hex quantities.

use crate::error::ReadError;
use hnforge_traits::selector;

const WORD: usize = 32;

/// Call argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `uint256`
    Uint(u64),
    /// `string`
    Str(&'a str),
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Calldata for `signature` with `args`: selector, head words, then tails
#[must_use]
pub fn encode_call(signature: &str, args: &[Token<'_>]) -> Vec<u8> {
    let mut head = Vec::with_capacity(args.len() * WORD);
    let mut tail = Vec::new();
    let head_size = args.len() * WORD;

    for arg in args {
        match arg {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Str(text) => {
                let offset = (head_size + tail.len()) as u64;
                head.extend_from_slice(&uint_word(offset));
                tail.extend_from_slice(&uint_word(text.len() as u64));
                let start = tail.len();
                tail.extend_from_slice(text.as_bytes());
                tail.resize(start + padded_len(text.len()), 0);
            }
        }
    }

    let mut data = selector(signature).to_vec();
    data.extend(head);
    data.extend(tail);
    data
}

/// The `index`-th 32-byte word of `data`
///
/// # Errors
/// `ReadError::Decode` when `data` is too short
pub fn word_at(data: &[u8], index: usize) -> Result<[u8; WORD], ReadError> {
    index
        .checked_mul(WORD)
        .and_then(|start| Some(start..start.checked_add(WORD)?))
        .and_then(|range| data.get(range))
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            ReadError::Decode(format!("word {index} out of bounds ({} bytes)", data.len()))
        })
}

/// A `uint256` word narrowed to `u64`
///
/// # Errors
/// `ReadError::Decode` when the value does not fit
pub fn word_to_u64(word: &[u8; WORD]) -> Result<u64, ReadError> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(ReadError::Decode(format!(
            "uint256 0x{} exceeds u64",
            hex::encode(word)
        )));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(low))
}

/// Single `uint256` return value
///
/// # Errors
/// `ReadError::Decode` on short or oversized data
pub fn decode_uint(data: &[u8]) -> Result<u64, ReadError> {
    word_to_u64(&word_at(data, 0)?)
}

/// Single `uint256[]` return value
///
/// # Errors
/// `ReadError::Decode` on malformed offsets or lengths
pub fn decode_uint_array(data: &[u8]) -> Result<Vec<u64>, ReadError> {
    let offset = usize::try_from(decode_uint(data)?)
        .map_err(|_| ReadError::Decode("array offset overflow".into()))?;
    if offset % WORD != 0 {
        return Err(ReadError::Decode(format!("unaligned array offset {offset}")));
    }
    let base = offset / WORD;
    let len = usize::try_from(word_to_u64(&word_at(data, base)?)?)
        .map_err(|_| ReadError::Decode("array length overflow".into()))?;
    (0..len)
        .map(|i| {
            let index = base
                .checked_add(1 + i)
                .ok_or_else(|| ReadError::Decode("array index overflow".into()))?;
            word_to_u64(&word_at(data, index)?)
        })
        .collect()
}

/// `0x`-prefixed hex byte string
///
/// # Errors
/// `ReadError::Decode` on invalid hex
pub fn parse_hex_data(s: &str) -> Result<Vec<u8>, ReadError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| ReadError::Decode(format!("invalid hex data: {e}")))
}

/// `0x`-prefixed hex quantity
///
/// # Errors
/// `ReadError::Decode` on invalid digits or overflow
pub fn parse_quantity(s: &str) -> Result<u64, ReadError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| ReadError::Decode(format!("invalid quantity {s}: {e}")))
}

/// Hex quantity for request parameters
#[must_use]
pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}
