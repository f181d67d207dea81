// Build script that generates the Poseidon tables from the parameter file.
// Build scripts are not on the hashing path, so we allow expect() and panic().
#![allow(clippy::expect_used)]
//
// Consumes `params/poseidon_goldilocks_t12.json` and generates
// `params_generated.rs` (width, round counts, round constants, MDS vectors and
// the fast partial round tables). Every table is size-checked against the
// width/round parameters; a mismatch fails the build.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const PARAMS_FILE: &str = "params/poseidon_goldilocks_t12.json";
const GOLDILOCKS_ORDER: u64 = 0xFFFF_FFFF_0000_0001;
const GOLDILOCKS_TWO_ADICITY: u32 = 32;

#[derive(Debug, Deserialize)]
struct ParamsFile {
    version: String,
    field: FieldParams,
    poseidon: PoseidonParams,
}

#[derive(Debug, Deserialize)]
struct FieldParams {
    modulus: String,
    two_adicity: u32,
}

#[derive(Debug, Deserialize)]
struct PoseidonParams {
    width: usize,
    rate: usize,
    capacity: usize,
    half_full_rounds: usize,
    partial_rounds: usize,
    sbox_alpha: u64,
    mds_matrix_circ: Vec<String>,
    mds_matrix_diag: Vec<String>,
    round_constants: Vec<Vec<String>>,
    fast_partial_first_round_constant: Vec<String>,
    fast_partial_round_constants: Vec<String>,
    fast_partial_round_initial_matrix: Vec<Vec<String>>,
    fast_partial_round_w_hats: Vec<Vec<String>>,
    fast_partial_round_vs: Vec<Vec<String>>,
}

fn main() {
    println!("cargo:rerun-if-changed={}", PARAMS_FILE);
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let params_path = Path::new(&manifest_dir).join(PARAMS_FILE);

    let content = fs::read_to_string(&params_path)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", params_path.display(), e));
    let params: ParamsFile = serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("cannot parse {}: {}", params_path.display(), e));

    if params.version != "1" {
        panic!("unsupported parameter file version '{}'", params.version);
    }
    let modulus = parse_u64(&params.field.modulus);
    if modulus != GOLDILOCKS_ORDER || params.field.two_adicity != GOLDILOCKS_TWO_ADICITY {
        panic!(
            "parameter file targets modulus {:#x} (two-adicity {}), expected Goldilocks",
            modulus, params.field.two_adicity
        );
    }

    let tables = Tables::validate(&params.poseidon);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out_path = Path::new(&out_dir).join("params_generated.rs");
    fs::write(&out_path, tables.render(&params.poseidon))
        .expect("Failed to write params_generated.rs");
}

/// Tables parsed to integers and checked against the declared geometry.
struct Tables {
    mds_circ: Vec<u64>,
    mds_diag: Vec<u64>,
    round_constants: Vec<Vec<u64>>,
    first_round_constant: Vec<u64>,
    partial_round_constants: Vec<u64>,
    initial_matrix: Vec<Vec<u64>>,
    w_hats: Vec<Vec<u64>>,
    vs: Vec<Vec<u64>>,
}

impl Tables {
    fn validate(p: &PoseidonParams) -> Self {
        let width = p.width;
        let n_rounds = 2 * p.half_full_rounds + p.partial_rounds;

        if p.rate + p.capacity != width {
            panic!(
                "rate ({}) + capacity ({}) must equal width ({})",
                p.rate, p.capacity, width
            );
        }
        if p.sbox_alpha != 7 {
            panic!("S-box exponent must be 7, got {}", p.sbox_alpha);
        }

        let mds_circ = vector("mds_matrix_circ", &p.mds_matrix_circ, width);
        let mds_diag = vector("mds_matrix_diag", &p.mds_matrix_diag, width);

        // Each generic MDS row is accumulated in a u128 before a single
        // reduction, so the sum of entries in any row must stay below 2^64.
        for r in 0..width {
            let row_sum = mds_circ
                .iter()
                .try_fold(mds_diag[r], |acc, &m| acc.checked_add(m));
            if row_sum.is_none() {
                panic!("MDS row {} is too large for 128-bit accumulation", r);
            }
        }

        let round_constants = matrix("round_constants", &p.round_constants, n_rounds, width);
        let first_round_constant = vector(
            "fast_partial_first_round_constant",
            &p.fast_partial_first_round_constant,
            width,
        );
        let partial_round_constants = vector(
            "fast_partial_round_constants",
            &p.fast_partial_round_constants,
            p.partial_rounds,
        );
        let initial_matrix = matrix(
            "fast_partial_round_initial_matrix",
            &p.fast_partial_round_initial_matrix,
            width - 1,
            width - 1,
        );
        let w_hats = matrix(
            "fast_partial_round_w_hats",
            &p.fast_partial_round_w_hats,
            p.partial_rounds,
            width - 1,
        );
        let vs = matrix(
            "fast_partial_round_vs",
            &p.fast_partial_round_vs,
            p.partial_rounds,
            width - 1,
        );

        Self {
            mds_circ,
            mds_diag,
            round_constants,
            first_round_constant,
            partial_round_constants,
            initial_matrix,
            w_hats,
            vs,
        }
    }

    fn render(&self, p: &PoseidonParams) -> String {
        let width = p.width;
        let n_rounds = 2 * p.half_full_rounds + p.partial_rounds;
        let mut code = String::new();

        code.push_str(&format!(
            r#"// Poseidon parameters generated from {file}.
//
// DO NOT EDIT - This file is generated by build.rs.

/// Permutation state width (t = {width}).
pub const WIDTH: usize = {width};

/// Sponge rate (r = {rate}).
pub const RATE: usize = {rate};

/// Sponge capacity (c = {capacity}).
pub const CAPACITY: usize = {capacity};

/// Full rounds applied before and after the partial rounds.
pub const HALF_N_FULL_ROUNDS: usize = {half};

/// Number of full rounds in total.
pub const N_FULL_ROUNDS_TOTAL: usize = {full};

/// Number of partial rounds.
pub const N_PARTIAL_ROUNDS: usize = {partial};

/// Total number of rounds.
pub const N_ROUNDS: usize = {n_rounds};

/// S-box exponent.
pub const SBOX_ALPHA: u64 = {alpha};

"#,
            file = PARAMS_FILE,
            width = width,
            rate = p.rate,
            capacity = p.capacity,
            half = p.half_full_rounds,
            full = 2 * p.half_full_rounds,
            partial = p.partial_rounds,
            n_rounds = n_rounds,
            alpha = p.sbox_alpha,
        ));

        code.push_str("/// First row of the circulant part of the MDS matrix.\n");
        code.push_str(&render_vector("MDS_MATRIX_CIRC", "WIDTH", &self.mds_circ));
        code.push_str("/// Diagonal part of the MDS matrix.\n");
        code.push_str(&render_vector("MDS_MATRIX_DIAG", "WIDTH", &self.mds_diag));

        code.push_str(&format!(
            "/// Round constants, {} rounds x {} lanes, row-major.\n",
            n_rounds, width
        ));
        code.push_str("pub const ALL_ROUND_CONSTANTS: [u64; WIDTH * N_ROUNDS] = [\n");
        for (round, row) in self.round_constants.iter().enumerate() {
            code.push_str(&format!("    // Round {}\n   ", round));
            for value in row {
                code.push_str(&format!(" {:#018x},", value));
            }
            code.push('\n');
        }
        code.push_str("];\n\n");

        code.push_str("/// Constants added by the single constant layer before the partial rounds.\n");
        code.push_str(&render_vector(
            "FAST_PARTIAL_FIRST_ROUND_CONSTANT",
            "WIDTH",
            &self.first_round_constant,
        ));
        code.push_str("/// Scalar constant added to lane 0 after each partial round S-box.\n");
        code.push_str(&render_vector(
            "FAST_PARTIAL_ROUND_CONSTANTS",
            "N_PARTIAL_ROUNDS",
            &self.partial_round_constants,
        ));
        code.push_str("/// Dense matrix applied to lanes 1.. once before the partial rounds.\n");
        code.push_str(&render_matrix(
            "FAST_PARTIAL_ROUND_INITIAL_MATRIX",
            "WIDTH - 1",
            "WIDTH - 1",
            &self.initial_matrix,
        ));
        code.push_str("/// Per-round first-row coefficients of the sparse partial round matrices.\n");
        code.push_str(&render_matrix(
            "FAST_PARTIAL_ROUND_W_HATS",
            "N_PARTIAL_ROUNDS",
            "WIDTH - 1",
            &self.w_hats,
        ));
        code.push_str("/// Per-round first-column coefficients of the sparse partial round matrices.\n");
        code.push_str(&render_matrix(
            "FAST_PARTIAL_ROUND_VS",
            "N_PARTIAL_ROUNDS",
            "WIDTH - 1",
            &self.vs,
        ));

        code
    }
}

fn parse_u64(s: &str) -> u64 {
    let digits = s
        .strip_prefix("0x")
        .unwrap_or_else(|| panic!("expected 0x-prefixed hex, got '{}'", s));
    u64::from_str_radix(digits, 16).unwrap_or_else(|e| panic!("bad hex '{}': {}", s, e))
}

fn canonical(name: &str, s: &str) -> u64 {
    let value = parse_u64(s);
    if value >= GOLDILOCKS_ORDER {
        panic!("{}: constant {} is not canonical", name, s);
    }
    value
}

fn vector(name: &str, values: &[String], len: usize) -> Vec<u64> {
    if values.len() != len {
        panic!("{}: expected {} entries, got {}", name, len, values.len());
    }
    values.iter().map(|v| canonical(name, v)).collect()
}

fn matrix(name: &str, rows: &[Vec<String>], n_rows: usize, n_cols: usize) -> Vec<Vec<u64>> {
    if rows.len() != n_rows {
        panic!("{}: expected {} rows, got {}", name, n_rows, rows.len());
    }
    rows.iter()
        .enumerate()
        .map(|(i, row)| vector(&format!("{}[{}]", name, i), row, n_cols))
        .collect()
}

fn render_vector(name: &str, len: &str, values: &[u64]) -> String {
    let mut code = format!("pub const {}: [u64; {}] = [\n   ", name, len);
    for value in values {
        code.push_str(&format!(" {:#018x},", value));
    }
    code.push_str("\n];\n\n");
    code
}

fn render_matrix(name: &str, rows: &str, cols: &str, values: &[Vec<u64>]) -> String {
    let mut code = format!("pub const {}: [[u64; {}]; {}] = [\n", name, cols, rows);
    for row in values {
        code.push_str("    [");
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                code.push_str(", ");
            }
            code.push_str(&format!("{:#018x}", value));
        }
        code.push_str("],\n");
    }
    code.push_str("];\n\n");
    code
}
