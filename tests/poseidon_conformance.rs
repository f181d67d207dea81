//! Poseidon permutation and sponge conformance tests.
//!
//! Reference vectors are the published outputs of the Poseidon-over-Goldilocks
//! width-12 permutation. The fast partial rounds are additionally checked
//! against the naive evaluation on random states.

use goldilocks_poseidon::field::ORDER;
use goldilocks_poseidon::poseidon::{
    hash, permute, permute_naive, permute_with_trace, two_to_one, HashOut, PoseidonState,
    ALL_ROUND_CONSTANTS, CAPACITY, HALF_N_FULL_ROUNDS, MDS_MATRIX_CIRC, MDS_MATRIX_DIAG,
    N_PARTIAL_ROUNDS, N_ROUNDS, RATE, SBOX_ALPHA, WIDTH,
};
use goldilocks_poseidon::GoldilocksField as F;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn state(values: [u64; WIDTH]) -> PoseidonState {
    values.map(F::from_canonical_u64)
}

fn canonical(state: &PoseidonState) -> [u64; WIDTH] {
    state.map(|x| x.to_canonical_u64())
}

// =============================================================================
// Parameters
// =============================================================================

#[test]
fn parameters_width_12() {
    assert_eq!(WIDTH, 12, "width");
    assert_eq!(RATE, 8, "rate");
    assert_eq!(CAPACITY, 4, "capacity");
    assert_eq!(RATE + CAPACITY, WIDTH);
}

#[test]
fn parameters_round_structure() {
    assert_eq!(HALF_N_FULL_ROUNDS, 4);
    assert_eq!(N_PARTIAL_ROUNDS, 22);
    assert_eq!(N_ROUNDS, 2 * HALF_N_FULL_ROUNDS + N_PARTIAL_ROUNDS);
    assert_eq!(N_ROUNDS, 30);
    assert_eq!(SBOX_ALPHA, 7);
}

#[test]
fn parameters_tables() {
    assert_eq!(MDS_MATRIX_CIRC, [17, 15, 41, 16, 2, 28, 13, 13, 39, 18, 34, 20]);
    assert_eq!(MDS_MATRIX_DIAG, [8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    assert_eq!(ALL_ROUND_CONSTANTS.len(), WIDTH * N_ROUNDS);
    assert_eq!(ALL_ROUND_CONSTANTS[0], 0xb585_f766_f214_4405);
    assert!(ALL_ROUND_CONSTANTS.iter().all(|&c| c < ORDER));
}

// =============================================================================
// Permutation Reference Vectors
// =============================================================================

#[test]
fn permute_all_zeros() {
    let out = permute(&state([0; WIDTH]));
    assert_eq!(
        canonical(&out),
        [
            0x3c18_a978_6cb0_b359,
            0xc405_5e33_64a2_46c3,
            0x7953_db0a_b488_08f4,
            0xc716_03f3_3a11_44ca,
            0xd770_9673_8969_96dc,
            0x46a8_4e87_642f_44ed,
            0xd032_6482_51ee_0b3c,
            0x1c68_7363_b207_df62,
            0xdf85_6556_3e80_45fe,
            0x40f5_b37f_f425_4dae,
            0xd070_f637_b431_067c,
            0x1792_b1c4_3421_09d7,
        ]
    );
}

#[test]
fn permute_counting_state() {
    let out = permute(&state([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]));
    assert_eq!(
        canonical(&out),
        [
            0xd64e_1e3e_fc5b_8e9e,
            0x5366_6633_020a_aa47,
            0xd402_8559_7c6a_8825,
            0x613a_4f81_e812_31d2,
            0x4147_54bf_ebd0_51f0,
            0xcb1f_8980_294a_023f,
            0x6eb2_a9e4_d54a_9d0f,
            0x1902_bc3a_f467_e056,
            0xf045_d5ea_fdc6_021f,
            0xe415_0f77_caaa_3be5,
            0xc9bf_d01d_39b5_0cce,
            0x5c0a_27fc_b0e1_459b,
        ]
    );
}

#[test]
fn permute_all_neg_one() {
    let out = permute(&state([ORDER - 1; WIDTH]));
    assert_eq!(
        canonical(&out),
        [
            0xbe00_85cf_c57a_8357,
            0xd95a_f718_47d0_5c09,
            0xcf55_a13d_33c1_c953,
            0x9580_3a74_f453_0e82,
            0xfcd9_9eb3_0a13_5df1,
            0xe095_905e_913a_3029,
            0xde03_9246_1b42_919b,
            0x7d32_60e2_4e81_d031,
            0x10d3_d046_5d9d_eaa0,
            0xa875_7108_3dfc_2a47,
            0xe182_6368_1e99_58f8,
            0xe28e_96f1_ae5e_60d3,
        ]
    );
}

#[test]
fn permute_all_ones() {
    let out = permute(&state([1; WIDTH]));
    assert_eq!(
        canonical(&out),
        [
            0xe3fd_1ad5_743c_4d77,
            0xb94b_3adc_599d_5630,
            0x0978_3d64_3dd4_5102,
            0xa89f_8f92_1605_bbc8,
            0xef71_a5f5_918a_9216,
            0x0643_3d79_3f9c_6ab4,
            0xfd9d_e42a_92f9_688b,
            0x253d_c16e_c66c_1b4b,
            0x98f3_f71e_44c7_1671,
            0x89a9_d809_2a8c_8b4a,
            0xaf4d_2445_4038_1bbb,
            0xb3b3_7e30_1501_d41d,
        ]
    );
}

#[test]
fn permute_noncanonical_input_equals_canonical() {
    // p + i is the same element as i.
    let shifted: PoseidonState =
        core::array::from_fn(|i| F::from_noncanonical_u64(ORDER + i as u64));
    let plain: PoseidonState = core::array::from_fn(|i| F::from_canonical_u64(i as u64));
    assert_eq!(permute(&shifted), permute(&plain));
}

#[test]
fn permute_deterministic() {
    let input = state([7; WIDTH]);
    assert_eq!(permute(&input), permute(&input));
}

// =============================================================================
// Fast vs Naive Partial Rounds
// =============================================================================

#[test]
fn fast_partial_rounds_match_naive_on_reference_states() {
    for input in [
        state([0; WIDTH]),
        state([1; WIDTH]),
        state([ORDER - 1; WIDTH]),
        state([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
    ] {
        assert_eq!(permute(&input), permute_naive(&input));
    }
}

#[test]
fn fast_partial_rounds_match_naive_on_random_states() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        // Full u64 range, so non-canonical lanes are exercised too.
        let input: PoseidonState = core::array::from_fn(|_| F::from_noncanonical_u64(rng.gen()));
        assert_eq!(
            canonical(&permute(&input)),
            canonical(&permute_naive(&input)),
            "input {:?}",
            input
        );
    }
}

// =============================================================================
// Trace Mode
// =============================================================================

#[test]
fn trace_has_one_state_per_round() {
    let input = state([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
    let (out, traces) = permute_with_trace(&input);
    assert_eq!(traces.len(), N_ROUNDS, "one entry per round");
    assert_eq!(out, permute(&input));
    assert_eq!(traces[N_ROUNDS - 1], out);
}

#[test]
fn trace_diverges_from_first_round() {
    // Every round is a bijection, so distinct inputs never share a state.
    let (_, a) = permute_with_trace(&state([1; WIDTH]));
    let (_, b) = permute_with_trace(&state([2; WIDTH]));
    for (round, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert_ne!(x, y, "round {} collides", round);
    }
}

// =============================================================================
// Sponge
// =============================================================================

#[test]
fn hash_reference_vectors() {
    let h = hash([1, 2, 3, 4].map(F::from_canonical_u64));
    assert_eq!(
        h.to_u64s(),
        [
            0xe4d9_2f53_e9ec_4028,
            0x1926_f523_32ba_f972,
            0xe9f8_5aac_8076_8641,
            0x62dc_cf35_feb3_efdb,
        ]
    );

    let h = hash([1, 2, 3, 5].map(F::from_canonical_u64));
    assert_eq!(
        h.to_u64s(),
        [
            0x8ec2_39c8_9250_5331,
            0x78ab_d2bc_040b_b84f,
            0x4c36_799f_151a_3928,
            0xb7dc_d7c8_cbd9_a629,
        ]
    );
}

#[test]
fn hash_single_input_change_changes_digest() {
    let base = hash([1, 2, 3, 4].map(F::from_canonical_u64));
    for lane in 0..4 {
        let mut input = [1, 2, 3, 4].map(F::from_canonical_u64);
        input[lane] += F::ONE;
        assert_ne!(hash(input), base, "lane {}", lane);
    }
}

#[test]
fn hash_zero_input_is_zero_permutation_prefix() {
    let h = hash([F::ZERO; 4]);
    assert_eq!(h.to_u64s()[0], 0x3c18_a978_6cb0_b359);
}

#[test]
fn two_to_one_fills_rate() {
    let left = HashOut::from_u64s([1, 2, 3, 4]);
    let right = HashOut::from_u64s([5, 6, 7, 8]);

    let mut st = [F::ZERO; WIDTH];
    st[..4].copy_from_slice(&left.elements);
    st[4..8].copy_from_slice(&right.elements);
    let out = permute(&st);

    assert_eq!(two_to_one(left, right).elements, [out[0], out[1], out[2], out[3]]);
    assert_ne!(two_to_one(left, right), two_to_one(right, left));
}

#[test]
fn two_to_one_with_zero_right_equals_hash() {
    // A zero right half leaves the same state as hashing the left half.
    let left = HashOut::from_u64s([9, 9, 9, 9]);
    assert_eq!(two_to_one(left, HashOut::default()), hash(left.elements));
}
