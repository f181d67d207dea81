//! Goldilocks prime field arithmetic.
//!
//! The field has order `p = 2^64 - 2^32 + 1`. Elements are stored as a single
//! `u64` that is allowed to be non-canonical (anywhere in `[0, 2^64)`); every
//! operation is correct for any stored word and canonicalisation only happens
//! when a value is observed (equality, encoding, display).
//!
//! - [`GoldilocksField`] - the element type and its reduction routines
//! - [`inverse`] - extended binary GCD inversion
//! - [`wide`] - 128/160-bit intermediates

mod goldilocks;
pub mod inverse;
pub mod wide;

pub use goldilocks::{reduce128, GoldilocksField};
pub(crate) use goldilocks::parse_hex_u64;

/// Field order `p = 2^64 - 2^32 + 1`.
pub const ORDER: u64 = 0xFFFF_FFFF_0000_0001;

/// `2^64 - p = 2^32 - 1`, so that `2^64 ≡ EPSILON (mod p)`.
pub const EPSILON: u64 = 0xFFFF_FFFF;

/// Largest `t` with `2^t | p - 1`.
pub const TWO_ADICITY: usize = 32;
