//! smc_pipeline — Deterministic orchestration of the SMC encoder pipeline
//! (load → encode → hand off to an external solver → decode → matching).
//!
//! Three flows per back-end:
//! - `formulate`: write the encoded instance (`.lp` / `.sat`) and stop.
//! - `solve`: encode to temp files, run the solver binary, decode its
//!   output into `instance.matching`. UNSAT/infeasible is not an error —
//!   the outcome carries an empty matching.
//! - `verify`: evaluate an externally supplied matching against every
//!   emitted constraint/clause and report the violations.
//!
//! The harness owns every temp file for the lifetime of a run; cleanup is
//! scoped, so it happens on the failure paths too.

pub mod harness;

use harness::{SolverConfig, TempNamer, TempSet};
use smc_core::cnf::ClauseSet;
use smc_core::instance::{Matching, ProblemInstance};
use smc_encode::{mip, sat, EncodeError};
use smc_io::dimacs::{write_problem_from_set, DimacsBuffer};
use smc_io::IoError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
    Sat,
    Mip,
}

impl Backend {
    /// Output suffix in solve mode.
    pub fn solution_suffix(self) -> &'static str {
        match self {
            Backend::Sat => ".satsolution",
            Backend::Mip => ".mipsolution",
        }
    }

    /// Output suffix in formulate mode.
    pub fn formulation_suffix(self) -> &'static str {
        match self {
            Backend::Sat => ".sat",
            Backend::Mip => ".lp",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{var} must contain the path to a solver binary")]
    MissingSolverPath { var: &'static str },
    #[error("cannot run solver {binary}: {source}")]
    SolverSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot {what}: {source}")]
    Harness {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Result of a solve run. An unsatisfiable instance yields
/// `satisfiable == false` and an empty matching.
#[derive(Debug)]
pub struct SolveOutcome {
    pub satisfiable: bool,
    pub matching: Matching,
    /// Reported by the MIP back-end only.
    pub objective: Option<f64>,
}

// ---- Formulate -------------------------------------------------------------

/// Encode the instance and write the constraint system to `dest` without
/// invoking any solver. With `verbose`, the SAT path prints every clause
/// with registry names and the MIP path prints the rendered LP.
pub fn formulate(
    inst: &ProblemInstance,
    backend: Backend,
    dest: &Path,
    namer: &mut TempNamer,
    verbose: bool,
) -> Result<(), PipelineError> {
    match backend {
        Backend::Mip => {
            let encoding = mip::encode_mip(inst)?;
            let text = encoding.render();
            if verbose {
                print!("{text}");
            }
            std::fs::write(dest, text)
                .map_err(|source| PipelineError::Harness { what: "write LP file", source })?;
            Ok(())
        }
        Backend::Sat => {
            if verbose {
                dump_instance(inst);
                let mut set = ClauseSet::new();
                let enc = sat::encode_sat(inst, &mut set)?;
                for clause in &set.clauses {
                    println!("{}", enc.render_clause(clause));
                }
                write_problem_from_set(&set, dest, enc.num_vars)?;
            } else {
                let work_dir = work_dir_of(dest);
                let mut temps = TempSet::new();
                let backing = temps.track(
                    namer.unused_path(|s| work_dir.join(format!("constraints_buffer-{s}"))),
                );
                let mut buffer = DimacsBuffer::create(&backing)?;
                let enc = sat::encode_sat(inst, &mut buffer)?;
                buffer.write_problem(dest, enc.num_vars)?;
            }
            Ok(())
        }
    }
}

// ---- Solve -----------------------------------------------------------------

/// Encode, run the configured solver, decode, and record the matching on
/// the instance. `problem_path` anchors the temp-file names (they land in
/// its directory, suffixed to keep concurrent runs apart).
pub fn solve(
    inst: &mut ProblemInstance,
    backend: Backend,
    config: &SolverConfig,
    problem_path: &Path,
    namer: &mut TempNamer,
    verbose: bool,
) -> Result<SolveOutcome, PipelineError> {
    match backend {
        Backend::Sat => solve_sat(inst, config, problem_path, namer, verbose),
        Backend::Mip => solve_mip(inst, config, problem_path, namer, verbose),
    }
}

fn solve_sat(
    inst: &mut ProblemInstance,
    config: &SolverConfig,
    problem_path: &Path,
    namer: &mut TempNamer,
    verbose: bool,
) -> Result<SolveOutcome, PipelineError> {
    let solver = config.require_sat()?.to_path_buf();
    let work_dir = work_dir_of(problem_path);
    let mut temps = TempSet::new();

    let input = temps.track(namer.unused_path(|s| {
        work_dir.join(format!("{}-{s}.sat", file_name_of(problem_path)))
    }));
    let output = temps.track(namer.unused_path(|s| work_dir.join(format!("output-{s}"))));

    // Encode. Verbose runs keep the clauses in memory for the registry
    // dump; normal runs stream through the bounded buffer.
    let enc = if verbose {
        dump_instance(inst);
        let mut set = ClauseSet::new();
        let enc = sat::encode_sat(inst, &mut set)?;
        for clause in &set.clauses {
            println!("{}", enc.render_clause(clause));
        }
        write_problem_from_set(&set, &input, enc.num_vars)?;
        enc
    } else {
        let backing = temps
            .track(namer.unused_path(|s| work_dir.join(format!("constraints_buffer-{s}"))));
        let mut buffer = DimacsBuffer::create(&backing)?;
        let enc = sat::encode_sat(inst, &mut buffer)?;
        buffer.write_problem(&input, enc.num_vars)?;
        enc
    };

    harness::run_solver(&solver, &[input.as_path()], None, &output)?;
    let text = std::fs::read_to_string(&output)
        .map_err(|source| PipelineError::Harness { what: "read solver output", source })?;

    let outcome = match sat::decode_model(&enc, inst, &text) {
        Some(matching) => {
            inst.matching = matching.clone();
            SolveOutcome { satisfiable: true, matching, objective: None }
        }
        None => SolveOutcome { satisfiable: false, matching: Matching::new(), objective: None },
    };
    Ok(outcome)
}

fn solve_mip(
    inst: &mut ProblemInstance,
    config: &SolverConfig,
    problem_path: &Path,
    namer: &mut TempNamer,
    verbose: bool,
) -> Result<SolveOutcome, PipelineError> {
    let solver = config.require_mip()?.to_path_buf();
    let work_dir = work_dir_of(problem_path);
    let mut temps = TempSet::new();

    let lp_path = temps.track(namer.unused_path(|s| {
        work_dir.join(format!("{}-{s}.lp", file_name_of(problem_path)))
    }));
    let script = temps.track(namer.unused_path(|s| work_dir.join(format!("script{s}"))));
    let output = temps.track(namer.unused_path(|s| work_dir.join(format!("output{s}"))));

    let encoding = mip::encode_mip(inst)?;
    let text = encoding.render();
    if verbose {
        print!("{text}");
    }
    std::fs::write(&lp_path, text)
        .map_err(|source| PipelineError::Harness { what: "write LP file", source })?;
    harness::write_cplex_script(&script, &lp_path)?;

    harness::run_solver(&solver, &[], Some(script.as_path()), &output)?;
    let captured = std::fs::read_to_string(&output)
        .map_err(|source| PipelineError::Harness { what: "read solver output", source })?;

    let outcome = match mip::parse_solution(&captured) {
        Some(solution) => {
            let matching = mip::matching_from_solution(inst, &solution)?;
            inst.matching = matching.clone();
            SolveOutcome { satisfiable: true, matching, objective: solution.objective }
        }
        None => SolveOutcome { satisfiable: false, matching: Matching::new(), objective: None },
    };
    Ok(outcome)
}

// ---- Verify ----------------------------------------------------------------

/// Evaluate `matching` against the selected encoding; returns one rendered
/// line per violated constraint/clause (empty = stable and feasible).
pub fn verify(
    inst: &ProblemInstance,
    backend: Backend,
    matching: &Matching,
) -> Result<Vec<String>, PipelineError> {
    match backend {
        Backend::Mip => {
            let violations = mip::verify_matching(inst, matching)?;
            Ok(violations
                .into_iter()
                .map(|v| {
                    let mut line = v.constraint;
                    let _ = write!(line, "   [lhs = {}]", v.lhs);
                    line
                })
                .collect())
        }
        Backend::Sat => {
            let violations = sat::verify_matching(inst, matching)?;
            Ok(violations.into_iter().map(|v| v.clause).collect())
        }
    }
}

// ---- Helpers ---------------------------------------------------------------

fn work_dir_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("."),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "problem".to_string())
}

/// Instance echo for verbose runs.
fn dump_instance(inst: &ProblemInstance) {
    for s in inst.singles() {
        println!("Single {} prefs {:?}", s.uid, uids(s.ranked.ordering()));
    }
    for c in inst.couples() {
        let pairs: Vec<(u32, u32)> =
            c.pairs().iter().map(|&(a, b)| (a.raw(), b.raw())).collect();
        println!("Couple {} prefs {pairs:?}", c.uid);
        for &m in &c.members {
            println!("    Resident {m}");
        }
    }
    for hosp in inst.hospitals() {
        println!(
            "Hospital {} capacity {} prefs {:?}",
            hosp.uid,
            hosp.capacity,
            hosp.prefs.ordering().iter().map(|r| r.raw()).collect::<Vec<_>>()
        );
    }
}

fn uids(hs: &[smc_core::ids::HospitalId]) -> Vec<u32> {
    hs.iter().map(|h| h.raw()).collect()
}
