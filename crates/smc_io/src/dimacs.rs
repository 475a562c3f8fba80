// crates/smc_io/src/dimacs.rs
//
// Streaming clause buffer. Clauses accumulate in a bounded in-memory window
// (5,000 by default); when the window fills they are appended to a backing
// file, so a million-clause encoding never lives in memory. `write_problem`
// prepends the `p cnf` header — the clause count is tracked incrementally,
// so no re-scan of the backing file is needed — and removes the backing
// file afterwards.

use crate::IoError;
use smc_core::cnf::{Clause, ClauseSet, ClauseSink};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const WINDOW_CLAUSES: usize = 5_000;

/// File-backed clause sink with a bounded in-memory window.
pub struct DimacsBuffer {
    backing: PathBuf,
    writer: BufWriter<File>,
    window: Vec<Clause>,
    window_cap: usize,
    count: u64,
}

impl DimacsBuffer {
    /// Create the buffer; the backing file is truncated.
    pub fn create(backing: &Path) -> Result<Self, IoError> {
        let file = File::create(backing)
            .map_err(|source| IoError::Write { path: backing.to_path_buf(), source })?;
        Ok(Self {
            backing: backing.to_path_buf(),
            writer: BufWriter::new(file),
            window: Vec::with_capacity(WINDOW_CLAUSES),
            window_cap: WINDOW_CLAUSES,
            count: 0,
        })
    }

    #[cfg(test)]
    fn with_window(backing: &Path, window_cap: usize) -> Result<Self, IoError> {
        let mut b = Self::create(backing)?;
        b.window_cap = window_cap;
        Ok(b)
    }

    fn drain_window(&mut self) -> io::Result<()> {
        for clause in self.window.drain(..) {
            self.writer.write_all(clause.dimacs().as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Append any windowed clauses to the backing file.
    pub fn flush(&mut self) -> Result<(), IoError> {
        self.drain_window()?;
        self.writer.flush()?;
        Ok(())
    }

    /// Assemble the final DIMACS file at `dest`: `p cnf <vars> <clauses>`
    /// header followed by the buffered body. Consumes the buffer and removes
    /// the backing file.
    pub fn write_problem(mut self, dest: &Path, num_vars: u32) -> Result<(), IoError> {
        self.flush()?;
        drop(self.writer);

        let out = File::create(dest)
            .map_err(|source| IoError::Write { path: dest.to_path_buf(), source })?;
        let mut out = BufWriter::new(out);
        writeln!(out, "p cnf {} {}", num_vars, self.count)
            .map_err(|source| IoError::Write { path: dest.to_path_buf(), source })?;

        let body = File::open(&self.backing)
            .map_err(|source| IoError::Read { path: self.backing.clone(), source })?;
        let body = BufReader::new(body);
        for line in body.lines() {
            let line = line.map_err(|source| IoError::Read { path: self.backing.clone(), source })?;
            if line.trim().is_empty() {
                continue;
            }
            writeln!(out, "{line}")
                .map_err(|source| IoError::Write { path: dest.to_path_buf(), source })?;
        }
        out.flush().map_err(|source| IoError::Write { path: dest.to_path_buf(), source })?;

        std::fs::remove_file(&self.backing)
            .map_err(|source| IoError::Write { path: self.backing.clone(), source })?;
        Ok(())
    }

    /// Drop the buffer and its backing file (failure path cleanup).
    pub fn discard(self) {
        drop(self.writer);
        let _ = std::fs::remove_file(&self.backing);
    }

    pub fn backing_path(&self) -> &Path {
        &self.backing
    }
}

impl ClauseSink for DimacsBuffer {
    fn push(&mut self, clause: Clause) -> io::Result<()> {
        self.window.push(clause);
        self.count += 1;
        if self.window.len() >= self.window_cap {
            self.drain_window()?;
        }
        Ok(())
    }

    fn clauses_pushed(&self) -> u64 {
        self.count
    }
}

/// Write an in-memory clause set as a complete DIMACS file (the verbose and
/// verify paths encode into a `ClauseSet` instead of the streaming buffer).
pub fn write_problem_from_set(
    set: &ClauseSet,
    dest: &Path,
    num_vars: u32,
) -> Result<(), IoError> {
    let out =
        File::create(dest).map_err(|source| IoError::Write { path: dest.to_path_buf(), source })?;
    let mut out = BufWriter::new(out);
    let write_err = |source| IoError::Write { path: dest.to_path_buf(), source };
    writeln!(out, "p cnf {} {}", num_vars, set.clauses.len()).map_err(write_err)?;
    for clause in &set.clauses {
        writeln!(out, "{}", clause.dimacs()).map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smc_core::cnf::{Lit, Var};

    fn clause(codes: &[i32]) -> Clause {
        Clause::new(
            codes
                .iter()
                .map(|&c| {
                    let v = Var(c.unsigned_abs());
                    if c > 0 {
                        Lit::positive(v)
                    } else {
                        Lit::negative(v)
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn windows_spill_to_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let backing = dir.path().join("buf");
        let mut b = DimacsBuffer::with_window(&backing, 2).unwrap();
        for i in 1..=5 {
            b.push(clause(&[i])).unwrap();
        }
        assert_eq!(b.clauses_pushed(), 5);
        let dest = dir.path().join("out.sat");
        b.write_problem(&dest, 5).unwrap();
        let text = std::fs::read_to_string(&dest).unwrap();
        assert_eq!(text, "p cnf 5 5\n1 0\n2 0\n3 0\n4 0\n5 0\n");
        assert!(!backing.exists());
    }

    #[test]
    fn empty_buffer_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let backing = dir.path().join("buf");
        let b = DimacsBuffer::create(&backing).unwrap();
        let dest = dir.path().join("out.sat");
        b.write_problem(&dest, 0).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "p cnf 0 0\n");
    }

    #[test]
    fn set_writer_matches_buffer_output() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = ClauseSet::new();
        set.push(clause(&[1, -2])).unwrap();
        set.push(clause(&[2])).unwrap();
        let dest = dir.path().join("out.sat");
        write_problem_from_set(&set, &dest, 2).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "p cnf 2 2\n1 -2 0\n2 0\n");
    }
}
