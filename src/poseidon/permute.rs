//! Poseidon permutation.
//!
//! The permutation applies 30 rounds total:
//! - 4 full rounds (every lane gets the S-box)
//! - 22 partial rounds (only lane 0 gets the S-box)
//! - 4 full rounds
//!
//! A full round is constant layer, S-box layer, MDS layer. The partial rounds
//! default to the fast sparse form; [`permute_naive`] runs them one by one
//! with the generic MDS layer and is what [`permute_with_trace`] records.

use super::mds::{mds_layer, mds_partial_layer_fast, mds_partial_layer_init};
use super::{
    PoseidonState, ALL_ROUND_CONSTANTS, FAST_PARTIAL_FIRST_ROUND_CONSTANT,
    FAST_PARTIAL_ROUND_CONSTANTS, HALF_N_FULL_ROUNDS, N_PARTIAL_ROUNDS, N_ROUNDS, WIDTH,
};
use crate::field::GoldilocksField;

/// How the partial rounds are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartialRounds {
    Fast,
    Naive,
}

/// Adds the round constants of `round_ctr` to every lane.
#[inline]
pub fn constant_layer(state: &mut PoseidonState, round_ctr: usize) {
    for (i, x) in state.iter_mut().enumerate() {
        *x = x.add_canonical_u64(ALL_ROUND_CONSTANTS[i + WIDTH * round_ctr]);
    }
}

/// `x^7`, computed as `x^3 * x^4`.
#[inline(always)]
pub fn sbox_monomial(x: GoldilocksField) -> GoldilocksField {
    let x2 = x.square();
    let x4 = x2.square();
    let x3 = x * x2;
    x3 * x4
}

/// S-box on every lane.
#[inline]
pub fn sbox_layer(state: &mut PoseidonState) {
    for x in state.iter_mut() {
        *x = sbox_monomial(*x);
    }
}

fn full_rounds(
    state: &mut PoseidonState,
    round_ctr: &mut usize,
    on_round: &mut impl FnMut(&PoseidonState),
) {
    for _ in 0..HALF_N_FULL_ROUNDS {
        constant_layer(state, *round_ctr);
        sbox_layer(state);
        *state = mds_layer(state);
        *round_ctr += 1;
        on_round(state);
    }
}

fn partial_rounds_fast(state: &mut PoseidonState, round_ctr: &mut usize) {
    for (x, &c) in state.iter_mut().zip(FAST_PARTIAL_FIRST_ROUND_CONSTANT.iter()) {
        *x = x.add_canonical_u64(c);
    }
    *state = mds_partial_layer_init(state);

    for (i, &c) in FAST_PARTIAL_ROUND_CONSTANTS.iter().enumerate() {
        state[0] = sbox_monomial(state[0]);
        state[0] = state[0].add_canonical_u64(c);
        *state = mds_partial_layer_fast(state, i);
    }
    *round_ctr += N_PARTIAL_ROUNDS;
}

fn partial_rounds_naive(
    state: &mut PoseidonState,
    round_ctr: &mut usize,
    on_round: &mut impl FnMut(&PoseidonState),
) {
    for _ in 0..N_PARTIAL_ROUNDS {
        constant_layer(state, *round_ctr);
        state[0] = sbox_monomial(state[0]);
        *state = mds_layer(state);
        *round_ctr += 1;
        on_round(state);
    }
}

/// Runs all rounds in place and returns how many were applied.
fn run_rounds(
    state: &mut PoseidonState,
    partial: PartialRounds,
    mut on_round: impl FnMut(&PoseidonState),
) -> usize {
    let mut round_ctr = 0;

    full_rounds(state, &mut round_ctr, &mut on_round);
    match partial {
        PartialRounds::Fast => partial_rounds_fast(state, &mut round_ctr),
        PartialRounds::Naive => partial_rounds_naive(state, &mut round_ctr, &mut on_round),
    }
    full_rounds(state, &mut round_ctr, &mut on_round);

    round_ctr
}

#[inline]
fn check_round_count(round_ctr: usize) {
    assert_eq!(
        round_ctr, N_ROUNDS,
        "Poseidon applied {} rounds, expected {}",
        round_ctr, N_ROUNDS
    );
}

/// Complete Poseidon permutation, fast partial rounds.
pub fn permute(input: &PoseidonState) -> PoseidonState {
    let mut state = *input;
    check_round_count(run_rounds(&mut state, PartialRounds::Fast, |_| {}));
    state
}

/// Complete Poseidon permutation with every partial round evaluated densely.
///
/// Same output as [`permute`]; slower, kept as a reference.
pub fn permute_naive(input: &PoseidonState) -> PoseidonState {
    let mut state = *input;
    check_round_count(run_rounds(&mut state, PartialRounds::Naive, |_| {}));
    state
}

/// Poseidon permutation with trace output for debugging.
///
/// Returns (final_state, round_traces) where each trace entry contains the
/// state after that round. Partial rounds are evaluated naively so every
/// entry is a real intermediate state.
pub fn permute_with_trace(input: &PoseidonState) -> (PoseidonState, Vec<PoseidonState>) {
    let mut state = *input;
    let mut traces = Vec::with_capacity(N_ROUNDS);
    check_round_count(run_rounds(&mut state, PartialRounds::Naive, |s| {
        traces.push(*s)
    }));
    (state, traces)
}

#[cfg(test)]
mod tests {
    use super::*;

    type F = GoldilocksField;

    fn counting(input: &PoseidonState, partial: PartialRounds) -> (PoseidonState, usize) {
        let mut state = *input;
        let n = run_rounds(&mut state, partial, |_| {});
        (state, n)
    }

    #[test]
    fn test_sbox_monomial() {
        let x = F::from_canonical_u64(3);
        assert_eq!(sbox_monomial(x), F::from_canonical_u64(2187));
        assert_eq!(sbox_monomial(F::ZERO), F::ZERO);
        assert_eq!(sbox_monomial(F::NEG_ONE), F::NEG_ONE);

        let y = F::from_canonical_u64(0xdead_beef_cafe_babe);
        assert_eq!(sbox_monomial(y), y.exp_u64(7));
    }

    #[test]
    fn test_round_counter() {
        let state = [F::ONE; WIDTH];
        assert_eq!(counting(&state, PartialRounds::Fast).1, N_ROUNDS);
        assert_eq!(counting(&state, PartialRounds::Naive).1, N_ROUNDS);
    }

    #[test]
    fn test_permute_deterministic() {
        let state: PoseidonState = core::array::from_fn(|i| F::from_canonical_u64(i as u64));
        let result1 = permute(&state);
        let result2 = permute(&state);
        assert_eq!(result1, result2);
    }

    #[test]
    fn test_permute_zero_state() {
        let out = permute(&[F::ZERO; WIDTH]);
        assert_eq!(out[0].to_canonical_u64(), 0x3c18_a978_6cb0_b359);
        assert_eq!(out[11].to_canonical_u64(), 0x1792_b1c4_3421_09d7);
    }

    #[test]
    fn test_fast_matches_naive() {
        let state: PoseidonState =
            core::array::from_fn(|i| F::from_noncanonical_u64(u64::MAX - 31 * i as u64));
        assert_eq!(permute(&state), permute_naive(&state));
    }

    #[test]
    fn test_permute_with_trace_length() {
        let state = [F::ONE; WIDTH];
        let (out, traces) = permute_with_trace(&state);
        assert_eq!(traces.len(), N_ROUNDS);
        assert_eq!(traces.last(), Some(&out));
        assert_eq!(out, permute(&state));
    }
}
