//! smc_io — File formats for the SMC encoder.
//!
//! - `problem`: the line-oriented problem format (`r` / `p` / `c` lines)
//! - `matching`: matching files (`m` header + `r <uid> <hospital|-1>` lines)
//! - `dimacs`: the bounded-memory clause buffer and CNF file assembly
//!
//! All parsing errors carry the 1-based line number of the offending line.

pub mod dimacs;
pub mod matching;
pub mod problem;

use std::io;
use std::path::PathBuf;

use smc_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl IoError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        IoError::Parse { line, msg: msg.into() }
    }
}
