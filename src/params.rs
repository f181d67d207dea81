//! Runtime view of the Poseidon parameter file.
//!
//! The permutation itself only ever uses the tables compiled in by the build
//! script. This module reads the same JSON format at run time so that an
//! external parameter file can be checked against what the binary was built
//! with, and so the built-in set can be exported.

use crate::error::{Error, Result};
use crate::field::{parse_hex_u64, ORDER, TWO_ADICITY};
use crate::poseidon::{
    ALL_ROUND_CONSTANTS, CAPACITY, FAST_PARTIAL_FIRST_ROUND_CONSTANT,
    FAST_PARTIAL_ROUND_CONSTANTS, FAST_PARTIAL_ROUND_INITIAL_MATRIX, FAST_PARTIAL_ROUND_VS,
    FAST_PARTIAL_ROUND_W_HATS, HALF_N_FULL_ROUNDS, MDS_MATRIX_CIRC, MDS_MATRIX_DIAG,
    N_PARTIAL_ROUNDS, N_ROUNDS, RATE, SBOX_ALPHA, WIDTH,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use tracing::{debug, info};

/// Parameter file format version understood by this crate.
pub const FORMAT_VERSION: &str = "1";

/// A `u64` stored as a `0x`-prefixed, zero-padded hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexU64(pub u64);

impl Serialize for HexU64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0.to_be_bytes())))
    }
}

impl<'de> Deserialize<'de> for HexU64 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_u64(&s).map(HexU64).map_err(serde::de::Error::custom)
    }
}

/// Field section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldParams {
    /// Prime modulus.
    pub modulus: HexU64,
    /// Two-adicity of `modulus - 1`.
    pub two_adicity: u32,
}

/// Poseidon section: geometry plus every table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseidonParams {
    /// State width.
    pub width: usize,
    /// Sponge rate.
    pub rate: usize,
    /// Sponge capacity.
    pub capacity: usize,
    /// Full rounds on each side of the partial rounds.
    pub half_full_rounds: usize,
    /// Partial rounds.
    pub partial_rounds: usize,
    /// S-box exponent.
    pub sbox_alpha: u64,
    /// First row of the circulant MDS part.
    pub mds_matrix_circ: Vec<HexU64>,
    /// Diagonal MDS part.
    pub mds_matrix_diag: Vec<HexU64>,
    /// Round constants, one row per round.
    pub round_constants: Vec<Vec<HexU64>>,
    /// Constant layer applied before the fast partial rounds.
    pub fast_partial_first_round_constant: Vec<HexU64>,
    /// Scalar lane-0 constants of the fast partial rounds.
    pub fast_partial_round_constants: Vec<HexU64>,
    /// Dense `(width - 1)^2` initial matrix.
    pub fast_partial_round_initial_matrix: Vec<Vec<HexU64>>,
    /// Per-round first-row vectors.
    pub fast_partial_round_w_hats: Vec<Vec<HexU64>>,
    /// Per-round first-column vectors.
    pub fast_partial_round_vs: Vec<Vec<HexU64>>,
}

/// A complete parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsFile {
    /// Format version, currently `"1"`.
    pub version: String,
    /// Field parameters.
    pub field: FieldParams,
    /// Permutation parameters.
    pub poseidon: PoseidonParams,
}

fn hex_vec(values: &[u64]) -> Vec<HexU64> {
    values.iter().copied().map(HexU64).collect()
}

fn hex_rows<const N: usize>(rows: &[[u64; N]]) -> Vec<Vec<HexU64>> {
    rows.iter().map(|row| hex_vec(row)).collect()
}

fn words(row: &[HexU64]) -> Vec<u64> {
    row.iter().map(|v| v.0).collect()
}

fn flat(rows: &[Vec<HexU64>]) -> Vec<u64> {
    rows.iter().flatten().map(|v| v.0).collect()
}

fn check_vector(table: &str, values: &[HexU64], len: usize) -> Result<()> {
    if values.len() != len {
        return Err(Error::TableSize {
            table: table.to_string(),
            expected: len,
            got: values.len(),
        });
    }
    if let Some(bad) = values.iter().find(|v| v.0 >= ORDER) {
        return Err(Error::NonCanonicalConstant {
            table: table.to_string(),
            value: bad.0,
        });
    }
    Ok(())
}

fn check_matrix(table: &str, rows: &[Vec<HexU64>], n_rows: usize, n_cols: usize) -> Result<()> {
    if rows.len() != n_rows {
        return Err(Error::TableSize {
            table: table.to_string(),
            expected: n_rows,
            got: rows.len(),
        });
    }
    for (i, row) in rows.iter().enumerate() {
        check_vector(&format!("{}[{}]", table, i), row, n_cols)?;
    }
    Ok(())
}

fn check_scalar(name: &'static str, expected: u64, got: u64) -> Result<()> {
    if expected != got {
        return Err(Error::ParameterMismatch {
            name,
            expected,
            got,
        });
    }
    Ok(())
}

impl ParamsFile {
    /// The parameter set compiled into this crate.
    pub fn builtin() -> Self {
        let round_constants = ALL_ROUND_CONSTANTS
            .chunks_exact(WIDTH)
            .map(hex_vec)
            .collect();

        Self {
            version: FORMAT_VERSION.to_string(),
            field: FieldParams {
                modulus: HexU64(ORDER),
                two_adicity: TWO_ADICITY as u32,
            },
            poseidon: PoseidonParams {
                width: WIDTH,
                rate: RATE,
                capacity: CAPACITY,
                half_full_rounds: HALF_N_FULL_ROUNDS,
                partial_rounds: N_PARTIAL_ROUNDS,
                sbox_alpha: SBOX_ALPHA,
                mds_matrix_circ: hex_vec(&MDS_MATRIX_CIRC),
                mds_matrix_diag: hex_vec(&MDS_MATRIX_DIAG),
                round_constants,
                fast_partial_first_round_constant: hex_vec(&FAST_PARTIAL_FIRST_ROUND_CONSTANT),
                fast_partial_round_constants: hex_vec(&FAST_PARTIAL_ROUND_CONSTANTS),
                fast_partial_round_initial_matrix: hex_rows(&FAST_PARTIAL_ROUND_INITIAL_MATRIX),
                fast_partial_round_w_hats: hex_rows(&FAST_PARTIAL_ROUND_W_HATS),
                fast_partial_round_vs: hex_rows(&FAST_PARTIAL_ROUND_VS),
            },
        }
    }

    /// Parses and validates a parameter file from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: ParamsFile = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Reads, parses and validates a parameter file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading Poseidon parameters from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let params = Self::from_json_str(&content)?;
        info!(
            "Loaded Poseidon parameters: width {}, {} rounds",
            params.poseidon.width,
            params.n_rounds()
        );
        Ok(params)
    }

    /// Total round count declared by the file.
    pub fn n_rounds(&self) -> usize {
        2 * self.poseidon.half_full_rounds + self.poseidon.partial_rounds
    }

    /// Checks internal consistency: version, field, geometry, table shapes,
    /// canonical constants and MDS accumulator headroom.
    pub fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(self.version.clone()));
        }
        if self.field.modulus.0 != ORDER {
            return Err(Error::ModulusMismatch {
                expected: ORDER,
                got: self.field.modulus.0,
            });
        }
        check_scalar("two_adicity", TWO_ADICITY as u64, self.field.two_adicity as u64)?;

        let p = &self.poseidon;
        let width = p.width;
        check_scalar("rate + capacity", width as u64, (p.rate + p.capacity) as u64)?;
        check_scalar("sbox_alpha", 7, p.sbox_alpha)?;

        check_vector("mds_matrix_circ", &p.mds_matrix_circ, width)?;
        check_vector("mds_matrix_diag", &p.mds_matrix_diag, width)?;
        for r in 0..width {
            let row_sum = p
                .mds_matrix_circ
                .iter()
                .try_fold(p.mds_matrix_diag[r].0, |acc, m| acc.checked_add(m.0));
            if row_sum.is_none() {
                return Err(Error::MdsTooLarge { row: r });
            }
        }

        check_matrix("round_constants", &p.round_constants, self.n_rounds(), width)?;
        check_vector(
            "fast_partial_first_round_constant",
            &p.fast_partial_first_round_constant,
            width,
        )?;
        check_vector(
            "fast_partial_round_constants",
            &p.fast_partial_round_constants,
            p.partial_rounds,
        )?;
        check_matrix(
            "fast_partial_round_initial_matrix",
            &p.fast_partial_round_initial_matrix,
            width.saturating_sub(1),
            width.saturating_sub(1),
        )?;
        check_matrix(
            "fast_partial_round_w_hats",
            &p.fast_partial_round_w_hats,
            p.partial_rounds,
            width.saturating_sub(1),
        )?;
        check_matrix(
            "fast_partial_round_vs",
            &p.fast_partial_round_vs,
            p.partial_rounds,
            width.saturating_sub(1),
        )?;
        Ok(())
    }

    /// Fails unless this file describes exactly the compiled-in permutation.
    pub fn ensure_matches_builtin(&self) -> Result<()> {
        self.validate()?;
        let p = &self.poseidon;
        check_scalar("width", WIDTH as u64, p.width as u64)?;
        check_scalar("rate", RATE as u64, p.rate as u64)?;
        check_scalar("capacity", CAPACITY as u64, p.capacity as u64)?;
        check_scalar("half_full_rounds", HALF_N_FULL_ROUNDS as u64, p.half_full_rounds as u64)?;
        check_scalar("partial_rounds", N_PARTIAL_ROUNDS as u64, p.partial_rounds as u64)?;
        check_scalar("rounds", N_ROUNDS as u64, self.n_rounds() as u64)?;

        let builtin = Self::builtin();
        for ((table, ours), (_, theirs)) in self.flat_tables().into_iter().zip(builtin.flat_tables()) {
            if let Some(index) = ours.iter().zip(theirs.iter()).position(|(a, b)| a != b) {
                return Err(Error::TableMismatch { table, index });
            }
        }
        debug!("Parameter file matches the built-in tables");
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn flat_tables(&self) -> Vec<(&'static str, Vec<u64>)> {
        let p = &self.poseidon;
        vec![
            ("mds_matrix_circ", words(&p.mds_matrix_circ)),
            ("mds_matrix_diag", words(&p.mds_matrix_diag)),
            ("round_constants", flat(&p.round_constants)),
            (
                "fast_partial_first_round_constant",
                words(&p.fast_partial_first_round_constant),
            ),
            ("fast_partial_round_constants", words(&p.fast_partial_round_constants)),
            (
                "fast_partial_round_initial_matrix",
                flat(&p.fast_partial_round_initial_matrix),
            ),
            ("fast_partial_round_w_hats", flat(&p.fast_partial_round_w_hats)),
            ("fast_partial_round_vs", flat(&p.fast_partial_round_vs)),
        ]
    }
}
