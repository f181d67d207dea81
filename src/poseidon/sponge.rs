//! Fixed-length sponge hashing.
//!
//! Inputs are written straight into the rate part of a zero state, one
//! permutation runs, and the first four lanes are the digest. There is no
//! padding or domain separation, so only fixed input lengths are supported.

use super::{permute, PoseidonState, RATE, WIDTH};
use crate::error::{Error, Result};
use crate::field::{GoldilocksField, ORDER};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Number of field elements in a digest.
pub const NUM_HASH_OUT_ELTS: usize = 4;

/// A Poseidon digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HashOut {
    /// Digest elements, lanes 0..4 of the output state.
    pub elements: [GoldilocksField; NUM_HASH_OUT_ELTS],
}

impl HashOut {
    /// Wraps four raw words as field elements.
    pub fn from_u64s(values: [u64; NUM_HASH_OUT_ELTS]) -> Self {
        Self {
            elements: values.map(GoldilocksField::from_noncanonical_u64),
        }
    }

    /// Canonical words.
    pub fn to_u64s(&self) -> [u64; NUM_HASH_OUT_ELTS] {
        self.elements.map(GoldilocksField::to_canonical_u64)
    }

    /// 32 bytes, each element canonical little-endian.
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, x) in bytes.chunks_exact_mut(8).zip(self.elements.iter()) {
            chunk.copy_from_slice(&x.to_bytes_le());
        }
        bytes
    }

    /// Inverse of [`HashOut::to_bytes`]; rejects non-canonical elements.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::DigestLength(bytes.len()));
        }
        let mut elements = [GoldilocksField::ZERO; NUM_HASH_OUT_ELTS];
        for (x, chunk) in elements.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            let value = u64::from_le_bytes(word);
            if value >= ORDER {
                return Err(Error::NonCanonicalConstant {
                    table: "digest".to_string(),
                    value,
                });
            }
            *x = GoldilocksField::from_canonical_u64(value);
        }
        Ok(Self { elements })
    }

    /// Lowercase hex of [`HashOut::to_bytes`].
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parses 64 hex digits (optionally `0x`-prefixed).
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| Error::InvalidHex(s.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl From<[GoldilocksField; NUM_HASH_OUT_ELTS]> for HashOut {
    fn from(elements: [GoldilocksField; NUM_HASH_OUT_ELTS]) -> Self {
        Self { elements }
    }
}

impl fmt::Debug for HashOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashOut(0x{})", self.to_hex())
    }
}

impl fmt::Display for HashOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for HashOut {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", self.to_hex()))
    }
}

impl<'de> Deserialize<'de> for HashOut {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        HashOut::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Writes `inputs` into lanes `0..inputs.len()` of a zero state, permutes and
/// returns lanes 0..4.
#[inline]
fn absorb_once(inputs: &[GoldilocksField]) -> HashOut {
    debug_assert!(inputs.len() <= RATE);
    let mut state: PoseidonState = [GoldilocksField::ZERO; WIDTH];
    state[..inputs.len()].copy_from_slice(inputs);

    let state = permute(&state);
    let mut elements = [GoldilocksField::ZERO; NUM_HASH_OUT_ELTS];
    elements.copy_from_slice(&state[..NUM_HASH_OUT_ELTS]);
    HashOut { elements }
}

/// Hashes exactly four field elements.
pub fn hash(input: [GoldilocksField; NUM_HASH_OUT_ELTS]) -> HashOut {
    absorb_once(&input)
}

/// Compresses two digests into one (Merkle node hashing).
pub fn two_to_one(left: HashOut, right: HashOut) -> HashOut {
    let mut inputs = [GoldilocksField::ZERO; 2 * NUM_HASH_OUT_ELTS];
    inputs[..NUM_HASH_OUT_ELTS].copy_from_slice(&left.elements);
    inputs[NUM_HASH_OUT_ELTS..].copy_from_slice(&right.elements);
    absorb_once(&inputs)
}
