// crates/smc_cli/src/args.rs
//
// Argument parsing & validation for `smp_c`. Offline and deterministic:
// inputs must be local files, and the default output path is derived from
// the problem path and the selected mode.

use clap::{Parser, ValueEnum};
use smc_pipeline::Backend;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "smp_c", about = "Stable matching with couples via MIP or SAT encoding")]
pub struct Args {
    /// The input problem file (`r`/`p`/`c` lines; see README.md).
    pub problem: PathBuf,

    /// The solver back-end to encode for.
    #[arg(long, value_enum)]
    pub solver: SolverChoice,

    /// Echo the instance and the full formulation while encoding.
    #[arg(short, long)]
    pub verbose: bool,

    /// Formulate, but do not solve, the problem.
    #[arg(long, conflicts_with = "verify")]
    pub formulate: bool,

    /// Output filename (default: `<problem>.satsolution` / `.mipsolution`
    /// when solving, `<problem>.sat` / `.lp` when formulating).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Check an existing matching file for stability instead of solving.
    #[arg(long, value_name = "MATCHING")]
    pub verify: Option<PathBuf>,

    /// Canonicalize every preference list to end with the nil option.
    #[arg(long)]
    pub append_nil: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SolverChoice {
    Sat,
    Mip,
}

impl SolverChoice {
    pub fn backend(self) -> Backend {
        match self {
            SolverChoice::Sat => Backend::Sat,
            SolverChoice::Mip => Backend::Mip,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    NotFound(String),
    NotAFile(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
            CliError::NotAFile(p) => write!(f, "not a regular file: {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Entry point used by main.rs.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

pub fn validate(args: &Args) -> Result<(), CliError> {
    ensure_file(&args.problem)?;
    if let Some(matching) = &args.verify {
        ensure_file(matching)?;
    }
    Ok(())
}

fn ensure_file(path: &PathBuf) -> Result<(), CliError> {
    let display = path.display().to_string();
    let meta = fs::metadata(path).map_err(|_| CliError::NotFound(display.clone()))?;
    if !meta.is_file() {
        return Err(CliError::NotAFile(display));
    }
    Ok(())
}

impl Args {
    /// Output path policy: an explicit `-o` wins; otherwise the problem
    /// path plus the mode's suffix.
    pub fn resolve_output(&self) -> PathBuf {
        if let Some(out) = &self.output {
            return out.clone();
        }
        let backend = self.solver.backend();
        let suffix = if self.formulate {
            backend.formulation_suffix()
        } else {
            backend.solution_suffix()
        };
        PathBuf::from(format!("{}{}", self.problem.display(), suffix))
    }
}
