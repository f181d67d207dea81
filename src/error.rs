//! Error handling for the Goldilocks Poseidon crate.
//!
//! The hashing core has no recoverable failures: broken internal invariants
//! panic. The variants here cover the two boundaries where bad input can
//! legitimately arrive, the parameter file loader and the batch driver.

use thiserror::Error;

/// Errors surfaced by parameter loading and the batch driver.
#[derive(Debug, Error)]
pub enum Error {
    /// The parameter file could not be read.
    #[error("cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),

    /// The parameter file is not valid JSON for the expected schema.
    #[error("malformed parameter file: {0}")]
    Json(#[from] serde_json::Error),

    /// A table entry is not a `0x`-prefixed 64-bit hex value.
    #[error("invalid hex value '{0}'")]
    InvalidHex(String),

    /// The parameter file declares a format version this crate does not read.
    #[error("unsupported parameter file version '{0}'")]
    UnsupportedVersion(String),

    /// The parameter file targets a different field.
    #[error("modulus {got:#x} does not match the Goldilocks modulus {expected:#x}")]
    ModulusMismatch {
        /// Modulus compiled into the crate.
        expected: u64,
        /// Modulus declared by the file.
        got: u64,
    },

    /// A scalar parameter (width, rate, round count, ...) disagrees with the
    /// compiled-in permutation.
    #[error("parameter {name}: expected {expected}, got {got}")]
    ParameterMismatch {
        /// Parameter name.
        name: &'static str,
        /// Value required by the permutation.
        expected: u64,
        /// Value declared by the file.
        got: u64,
    },

    /// A table has the wrong number of rows or entries.
    #[error("table {table}: expected {expected} entries, got {got}")]
    TableSize {
        /// Table name, with a row index for nested tables.
        table: String,
        /// Required length.
        expected: usize,
        /// Length found in the file.
        got: usize,
    },

    /// A table entry is not reduced modulo the field order.
    #[error("table {table}: constant {value:#x} is not canonical")]
    NonCanonicalConstant {
        /// Table name.
        table: String,
        /// Offending value.
        value: u64,
    },

    /// The MDS entries are too large for single-reduction row accumulation.
    #[error("MDS row {row} overflows the 128-bit accumulator")]
    MdsTooLarge {
        /// Offending row.
        row: usize,
    },

    /// A well-formed table differs from the compiled-in one.
    #[error("table {table} differs from the built-in parameters at index {index}")]
    TableMismatch {
        /// Table name.
        table: &'static str,
        /// First differing flat index.
        index: usize,
    },

    /// A serialized digest is not 32 bytes.
    #[error("digest must be 32 bytes, got {0}")]
    DigestLength(usize),

    /// Batch input is not a whole number of 4-element jobs.
    #[error("batch input length {got} is not a multiple of {chunk}")]
    InputLength {
        /// Input length in u64 words.
        got: usize,
        /// Required chunk size.
        chunk: usize,
    },

    /// Batch output buffer does not match the number of jobs.
    #[error("batch output length {got} does not match the expected {expected}")]
    OutputLength {
        /// Required output length in u64 words.
        expected: usize,
        /// Provided output length.
        got: usize,
    },

    /// A batch was requested with zero lanes.
    #[error("lane count must be at least 1")]
    ZeroLaneCount,

    /// A lane index outside `0..count`.
    #[error("lane index {index} out of range for {count} lanes")]
    LaneOutOfRange {
        /// Requested index.
        index: usize,
        /// Total lane count.
        count: usize,
    },

    /// A lane was handed a job index past the end of the batch.
    #[error("job {job} out of range for a batch of {num_jobs} jobs")]
    JobOutOfRange {
        /// Requested job index.
        job: usize,
        /// Jobs in the batch.
        num_jobs: usize,
    },
}

/// Result type for parameter loading and batch operations.
pub type Result<T> = std::result::Result<T, Error>;
