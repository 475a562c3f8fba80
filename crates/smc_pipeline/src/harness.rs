// crates/smc_pipeline/src/harness.rs
//
// External-solver plumbing: solver paths from the environment, temp-file
// naming with a collision-retry loop, the CPLEX driver script, synchronous
// process spawns with redirected stdin/stdout, and RAII cleanup that runs
// on success and failure alike.

use crate::PipelineError;
use smc_core::rng::{rng_from_seed, SeededRng};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Environment variable naming the SAT solver binary (DIMACS in, model out).
pub const SAT_SOLVER_ENV: &str = "SAT_SOLVER_PATH";
/// Environment variable naming the MIP solver binary (CPLEX-compatible).
pub const CPLEX_ENV: &str = "CPLEX_PATH";

/// Branch-and-bound tree memory limit handed to the MIP solver, in MB.
pub const TREE_MEMORY_LIMIT: &str = "12000";

/// Resolved solver binaries. Each is only required when actually solving
/// with that back-end.
#[derive(Clone, Debug, Default)]
pub struct SolverConfig {
    pub sat_solver: Option<PathBuf>,
    pub mip_solver: Option<PathBuf>,
}

impl SolverConfig {
    pub fn from_env() -> Self {
        Self {
            sat_solver: std::env::var_os(SAT_SOLVER_ENV).map(PathBuf::from),
            mip_solver: std::env::var_os(CPLEX_ENV).map(PathBuf::from),
        }
    }

    pub fn require_sat(&self) -> Result<&Path, PipelineError> {
        self.sat_solver
            .as_deref()
            .ok_or(PipelineError::MissingSolverPath { var: SAT_SOLVER_ENV })
    }

    pub fn require_mip(&self) -> Result<&Path, PipelineError> {
        self.mip_solver
            .as_deref()
            .ok_or(PipelineError::MissingSolverPath { var: CPLEX_ENV })
    }
}

/// Random temp-file suffixes (0..100000), seedable so tests can pin the
/// names. The retry loop in `unused_path` avoids collisions with files that
/// already exist, which also keeps concurrent runs apart.
pub struct TempNamer {
    rng: SeededRng,
}

impl TempNamer {
    /// Seed from wall clock and pid; good enough to keep parallel runs from
    /// fighting over names (existence is still checked before use).
    pub fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0);
        Self::from_seed(nanos ^ (std::process::id() as u64).rotate_left(32))
    }

    pub fn from_seed(seed: u64) -> Self {
        Self { rng: rng_from_seed(seed) }
    }

    pub fn suffix(&mut self) -> u32 {
        self.rng.below(100_000) as u32
    }

    /// First path produced by `make` that does not exist yet.
    pub fn unused_path(&mut self, make: impl Fn(u32) -> PathBuf) -> PathBuf {
        loop {
            let path = make(self.suffix());
            if !path.exists() {
                return path;
            }
        }
    }
}

impl Default for TempNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// Temp files owned by one solver run; removed when the set drops, whether
/// the run succeeded or not.
#[derive(Default)]
pub struct TempSet {
    paths: Vec<PathBuf>,
}

impl TempSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: PathBuf) -> PathBuf {
        self.paths.push(path.clone());
        path
    }
}

impl Drop for TempSet {
    fn drop(&mut self) {
        for path in &self.paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// The CPLEX interactive-optimizer driver script: raise the tree-memory
/// limit, read the LP, optimize, dump every variable, quit.
pub fn write_cplex_script(path: &Path, lp_path: &Path) -> Result<(), PipelineError> {
    let script = format!(
        "set\nmip\nlimits\ntreememory\n{}\nread {}\noptimize\ndisplay solution variables -\nquit",
        TREE_MEMORY_LIMIT,
        lp_path.display()
    );
    std::fs::write(path, script).map_err(|source| PipelineError::Harness {
        what: "write solver script",
        source,
    })
}

/// Run `binary` with optional arguments, stdin redirected from a file, and
/// stdout captured to a file. The exit status is deliberately not
/// inspected: SAT solvers signal SAT/UNSAT through nonzero codes, and the
/// original driver ignored CPLEX's status too — the output file decides.
pub fn run_solver(
    binary: &Path,
    args: &[&Path],
    stdin: Option<&Path>,
    stdout: &Path,
) -> Result<(), PipelineError> {
    let spawn_err = |source| PipelineError::SolverSpawn { binary: binary.to_path_buf(), source };
    let harness_err = |what| move |source| PipelineError::Harness { what, source };

    let out = File::create(stdout).map_err(harness_err("create solver output capture"))?;
    let mut cmd = Command::new(binary);
    cmd.args(args).stdout(Stdio::from(out));
    match stdin {
        Some(path) => {
            let f = File::open(path).map_err(harness_err("open solver script"))?;
            cmd.stdin(Stdio::from(f));
        }
        None => {
            cmd.stdin(Stdio::null());
        }
    }
    let mut child = cmd.spawn().map_err(spawn_err)?;
    child.wait().map_err(spawn_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_namer_reproduces_suffixes() {
        let mut a = TempNamer::from_seed(11);
        let mut b = TempNamer::from_seed(11);
        for _ in 0..8 {
            assert_eq!(a.suffix(), b.suffix());
        }
    }

    #[test]
    fn suffixes_stay_below_bound() {
        let mut n = TempNamer::from_seed(3);
        for _ in 0..64 {
            assert!(n.suffix() < 100_000);
        }
    }

    #[test]
    fn unused_path_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut namer = TempNamer::from_seed(7);
        let first = namer.suffix();
        // occupy the name the next namer draw would pick
        let occupied = dir.path().join(format!("t-{first}"));
        std::fs::write(&occupied, b"x").unwrap();
        let mut namer = TempNamer::from_seed(7);
        let chosen = namer.unused_path(|s| dir.path().join(format!("t-{s}")));
        assert_ne!(chosen, occupied);
        assert!(!chosen.exists());
    }

    #[test]
    fn temp_set_removes_tracked_files_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch");
        std::fs::write(&path, b"x").unwrap();
        {
            let mut set = TempSet::new();
            set.track(path.clone());
        }
        assert!(!path.exists());
    }

    #[test]
    fn cplex_script_shape() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script1");
        write_cplex_script(&script, Path::new("problem-1.lp")).unwrap();
        let text = std::fs::read_to_string(&script).unwrap();
        assert_eq!(
            text,
            "set\nmip\nlimits\ntreememory\n12000\nread problem-1.lp\noptimize\ndisplay solution variables -\nquit"
        );
    }
}
