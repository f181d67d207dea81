//! MDS mixing layers.
//!
//! The generic layer multiplies by `circ(MDS_MATRIX_CIRC) + diag(MDS_MATRIX_DIAG)`.
//! Entries are small, so a whole row accumulates in a `u128` and is reduced
//! once. The partial-round layers use the factored form of the same matrix.

use super::{
    PoseidonState, FAST_PARTIAL_ROUND_INITIAL_MATRIX, FAST_PARTIAL_ROUND_VS,
    FAST_PARTIAL_ROUND_W_HATS, MDS_MATRIX_CIRC, MDS_MATRIX_DIAG, WIDTH,
};
use crate::field::wide::{self, U160};
use crate::field::{reduce128, GoldilocksField};

/// Row `r` of the MDS product on raw words, unreduced.
#[inline(always)]
fn mds_row_shf(r: usize, v: &[u64; WIDTH]) -> u128 {
    let mut res = 0u128;
    for i in 0..WIDTH {
        res += (v[(i + r) % WIDTH] as u128) * (MDS_MATRIX_CIRC[i] as u128);
    }
    res += (v[r] as u128) * (MDS_MATRIX_DIAG[r] as u128);
    res
}

/// Generic MDS layer.
pub fn mds_layer(state: &PoseidonState) -> PoseidonState {
    let mut raw = [0u64; WIDTH];
    for (word, x) in raw.iter_mut().zip(state.iter()) {
        *word = x.to_noncanonical_u64();
    }

    let mut result = [GoldilocksField::ZERO; WIDTH];
    for (r, out) in result.iter_mut().enumerate() {
        *out = reduce128(mds_row_shf(r, &raw));
    }
    result
}

/// Dense mix applied once before the fast partial rounds.
///
/// Lane 0 passes through; lanes `1..` are multiplied by the initial matrix.
pub fn mds_partial_layer_init(state: &PoseidonState) -> PoseidonState {
    let mut result = [GoldilocksField::ZERO; WIDTH];
    result[0] = state[0];

    for r in 1..WIDTH {
        for c in 1..WIDTH {
            let t = GoldilocksField::from_canonical_u64(FAST_PARTIAL_ROUND_INITIAL_MATRIX[r - 1][c - 1]);
            result[c] += state[r] * t;
        }
    }
    result
}

/// Sparse MDS layer for partial round `r`.
///
/// New lane 0 is `(CIRC[0] + DIAG[0]) * s0 + sum(W_HAT[r][i - 1] * s[i])`,
/// accumulated in 160 bits. Every other lane becomes `s[i] + V[r][i - 1] * s0`.
pub fn mds_partial_layer_fast(state: &PoseidonState, r: usize) -> PoseidonState {
    let s0 = state[0].to_noncanonical_u64();
    let mds0to0 = MDS_MATRIX_CIRC[0] + MDS_MATRIX_DIAG[0];

    let mut d_sum = U160::ZERO.add_product(s0, mds0to0);
    for i in 1..WIDTH {
        d_sum = d_sum.add_product(
            state[i].to_noncanonical_u64(),
            FAST_PARTIAL_ROUND_W_HATS[r][i - 1],
        );
    }

    let mut result = [GoldilocksField::ZERO; WIDTH];
    result[0] = reduce_u160(d_sum);
    for i in 1..WIDTH {
        let v = GoldilocksField::from_canonical_u64(FAST_PARTIAL_ROUND_VS[r][i - 1]);
        result[i] = state[i].multiply_accumulate(state[0], v);
    }
    result
}

/// Reduces `lo + hi * 2^128` in two steps: the top 96 bits first, then the
/// resulting 128-bit value.
#[inline(always)]
fn reduce_u160(x: U160) -> GoldilocksField {
    let (lo, hi) = wide::split(x.lo);
    let reduced_hi = GoldilocksField::from_noncanonical_u96(hi, x.hi);
    reduce128(wide::join(lo, reduced_hi.to_noncanonical_u64()))
}
