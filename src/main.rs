//! Goldilocks Poseidon CLI.
//!
//! Hashes single inputs or whole batches and inspects the compiled-in
//! parameter set. Logs go to stderr, filtered by `RUST_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use goldilocks_poseidon::{hash_batch, GoldilocksField, ParamsFile, PARAMS_ID};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "goldilocks-poseidon")]
#[command(about = "Poseidon hashing over the Goldilocks field", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Print the built-in parameter tables as JSON
    ExportParams,

    /// Check a parameter file against the built-in tables
    CheckParams {
        /// Path to the parameter JSON file
        path: PathBuf,
    },

    /// Hash four field elements (decimal or 0x-prefixed hex)
    Hash {
        /// Exactly four input words
        #[arg(num_args = 4, required = true, value_parser = parse_word)]
        elements: Vec<u64>,
    },

    /// Hash a JSON array of u64 words, four per job
    Batch {
        /// Number of parallel lanes (defaults to the rayon thread count)
        #[arg(long)]
        lanes: Option<usize>,

        /// Input file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn parse_word(s: &str) -> Result<u64, String> {
    match s.strip_prefix("0x") {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|e| format!("invalid word '{}': {}", s, e))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(msg: impl std::fmt::Display) -> ExitCode {
    eprintln!("error: {}", msg);
    ExitCode::FAILURE
}

fn run_hash(elements: &[u64]) -> ExitCode {
    let mut input = [GoldilocksField::ZERO; 4];
    for (x, &w) in input.iter_mut().zip(elements) {
        *x = GoldilocksField::from_noncanonical_u64(w);
    }
    let digest = goldilocks_poseidon::hash(input);
    let out = serde_json::json!({
        "digest": digest.to_u64s(),
        "hex": digest.to_hex(),
    });
    println!("{}", out);
    ExitCode::SUCCESS
}

fn run_batch(lanes: Option<usize>, input: Option<PathBuf>) -> ExitCode {
    let content = match input {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => return fail(format!("cannot read {}: {}", path.display(), e)),
        },
        None => {
            let mut buf = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
                return fail(format!("cannot read stdin: {}", e));
            }
            buf
        }
    };

    let words: Vec<u64> = match serde_json::from_str(&content) {
        Ok(w) => w,
        Err(e) => return fail(format!("input must be a JSON array of u64: {}", e)),
    };
    let lanes = lanes.unwrap_or_else(rayon::current_num_threads);
    debug!("Batch of {} words, {} lanes", words.len(), lanes);

    match hash_batch(&words, lanes) {
        Ok(digests) => match serde_json::to_string(&digests) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        },
        Err(e) => fail(e),
    }
}

fn run_check_params(path: PathBuf) -> ExitCode {
    let result = ParamsFile::load(&path).and_then(|p| p.ensure_matches_builtin());
    match result {
        Ok(()) => {
            println!("{}: matches {}", path.display(), PARAMS_ID);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) | None => {
            println!("goldilocks-poseidon v{}", env!("CARGO_PKG_VERSION"));
            println!("parameters: {}", PARAMS_ID);
            ExitCode::SUCCESS
        }
        Some(Commands::ExportParams) => match ParamsFile::builtin().to_json_pretty() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        },
        Some(Commands::CheckParams { path }) => run_check_params(path),
        Some(Commands::Hash { elements }) => run_hash(&elements),
        Some(Commands::Batch { lanes, input }) => run_batch(lanes, input),
    }
}
