//! Goldilocks field arithmetic and a width-12 Poseidon hash, batched across
//! parallel lanes.
//!
//! Digests are bit-compatible with the standard Poseidon-over-Goldilocks
//! width-12 parameterisation (rate 8, capacity 4, 30 rounds, `x^7` S-box).
//!
//! # Architecture
//!
//! - [`field`] - Goldilocks prime field (`p = 2^64 - 2^32 + 1`), reduction, inversion
//! - [`poseidon`] - Permutation (fast and naive partial rounds) and fixed-length sponge
//! - [`batch`] - Strided lane partition and the rayon batch driver
//! - [`params`] - Runtime loader/validator for the parameter file format
//! - [`error`] - Error type for the parameter and batch boundaries
//!
//! # Parameters
//!
//! `build.rs` reads `params/poseidon_goldilocks_t12.json`, validates every
//! table and compiles them in as `const` data; the hashing path never touches
//! the file system.

// Hashing code must avoid unwrap/expect/panic in library code.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod field;
pub mod params;
pub mod poseidon;

/// Identifier of the compiled-in parameter set.
pub const PARAMS_ID: &str = "poseidon-goldilocks-t12-v1";

// Re-export commonly used types
pub use batch::{hash_batch, hash_batch_into, hash_lane, hash_sequential, BatchView, Lane};
pub use error::{Error, Result};
pub use field::GoldilocksField;
pub use params::ParamsFile;
pub use poseidon::{hash, permute, two_to_one, HashOut};
