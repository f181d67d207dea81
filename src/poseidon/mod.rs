//! Poseidon permutation and fixed-length sponge over Goldilocks.
//!
//! Width 12 (rate 8, capacity 4), S-box `x^7`, 4 full rounds, 22 partial
//! rounds, 4 full rounds. The partial rounds run in the sparse-matrix form
//! (one dense initial mix, then per-round `w_hat`/`v` vectors); the naive form
//! is kept alongside for tracing and cross-checking.
//!
//! All numeric tables come from `params/poseidon_goldilocks_t12.json` through
//! the build script and are plain `const` data.

mod mds;
mod permute;
mod sponge;

pub use mds::{mds_layer, mds_partial_layer_fast, mds_partial_layer_init};
pub use permute::{
    constant_layer, permute, permute_naive, permute_with_trace, sbox_layer, sbox_monomial,
};
pub use sponge::{hash, two_to_one, HashOut, NUM_HASH_OUT_ELTS};

use crate::field::GoldilocksField;

/// A full permutation state.
pub type PoseidonState = [GoldilocksField; WIDTH];

// Include generated parameters
include!(concat!(env!("OUT_DIR"), "/params_generated.rs"));
