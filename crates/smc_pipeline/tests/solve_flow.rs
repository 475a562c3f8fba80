// crates/smc_pipeline/tests/solve_flow.rs
//
// End-to-end flows against stub solver scripts: the harness must write the
// encoded files, drive the binary with the right redirections, decode its
// output, and leave no temp files behind.

#![cfg(unix)]

use smc_core::ids::{HospitalId, ResidentId};
use smc_core::instance::ProblemInstance;
use smc_pipeline::harness::{SolverConfig, TempNamer};
use smc_pipeline::{formulate, solve, verify, Backend};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const PROBLEM: &str = "\
# one seat, two aspirants
r 1 7
r 2 7
p 7 1 1 2
";

fn load(dir: &Path) -> (ProblemInstance, PathBuf) {
    let problem_path = dir.join("problem.txt");
    fs::write(&problem_path, PROBLEM).unwrap();
    let inst =
        smc_io::problem::load_problem(&problem_path, smc_io::problem::LoadOptions::default())
            .unwrap();
    (inst, problem_path)
}

fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let mut perm = fs::metadata(&path).unwrap().permissions();
    perm.set_mode(0o755);
    fs::set_permissions(&path, perm).unwrap();
    path
}

fn leftover_temps(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| {
            n.starts_with("output")
                || n.starts_with("script")
                || n.starts_with("constraints_buffer")
                || n.contains(".sat")
                || n.contains(".lp")
        })
        .collect()
}

#[test]
fn formulate_writes_dimacs_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let (inst, _) = load(dir.path());
    let dest = dir.path().join("problem.sat");
    let mut namer = TempNamer::from_seed(1);
    formulate(&inst, Backend::Sat, &dest, &mut namer, false).unwrap();
    let text = fs::read_to_string(&dest).unwrap();
    assert!(text.starts_with("p cnf 9 "), "{text}");
    // backing buffer was cleaned up
    assert!(!fs::read_dir(dir.path())
        .unwrap()
        .any(|e| e.unwrap().file_name().to_string_lossy().starts_with("constraints_buffer")));
}

#[test]
fn formulate_writes_lp() {
    let dir = tempfile::tempdir().unwrap();
    let (inst, _) = load(dir.path());
    let dest = dir.path().join("problem.lp");
    let mut namer = TempNamer::from_seed(1);
    formulate(&inst, Backend::Mip, &dest, &mut namer, false).unwrap();
    let text = fs::read_to_string(&dest).unwrap();
    assert!(text.starts_with("Maximize\nobj: x_1,7\n"), "{text}");
    assert!(text.ends_with("End\n"), "{text}");
}

#[test]
fn formulation_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let (inst, _) = load(dir.path());
    let mut namer = TempNamer::from_seed(5);
    let a = dir.path().join("a.sat");
    let b = dir.path().join("b.sat");
    formulate(&inst, Backend::Sat, &a, &mut namer, false).unwrap();
    formulate(&inst, Backend::Sat, &b, &mut namer, false).unwrap();
    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

#[test]
fn sat_solve_decodes_stub_model() {
    let dir = tempfile::tempdir().unwrap();
    let (mut inst, problem_path) = load(dir.path());
    // vars: 1 xr_1,7  2 xr_1,nil  3 xr_2,7  4 xr_2,nil  5..9 counters
    let stub = write_stub(
        dir.path(),
        "fake-sat",
        "#!/bin/sh\necho 's SATISFIABLE'\necho 'v 1 -2 -3 4 -5 6 7 -8 -9 0'\n",
    );
    let config = SolverConfig { sat_solver: Some(stub), mip_solver: None };
    let mut namer = TempNamer::from_seed(2);
    let outcome = solve(&mut inst, Backend::Sat, &config, &problem_path, &mut namer, false).unwrap();
    assert!(outcome.satisfiable);
    assert_eq!(outcome.matching.get(&ResidentId(1)), Some(&HospitalId(7)));
    assert_eq!(inst.matching, outcome.matching);
    // the matching it decoded is actually stable
    assert!(verify(&inst, Backend::Sat, &outcome.matching).unwrap().is_empty());
    assert_eq!(leftover_temps(dir.path()), Vec::<String>::new());
}

#[test]
fn sat_unsat_yields_empty_matching() {
    let dir = tempfile::tempdir().unwrap();
    let (mut inst, problem_path) = load(dir.path());
    let stub = write_stub(dir.path(), "fake-sat", "#!/bin/sh\necho 's UNSATISFIABLE'\nexit 20\n");
    let config = SolverConfig { sat_solver: Some(stub), mip_solver: None };
    let mut namer = TempNamer::from_seed(3);
    let outcome = solve(&mut inst, Backend::Sat, &config, &problem_path, &mut namer, false).unwrap();
    assert!(!outcome.satisfiable);
    assert!(outcome.matching.is_empty());
}

#[test]
fn mip_solve_reads_script_and_decodes_values() {
    let dir = tempfile::tempdir().unwrap();
    let (mut inst, problem_path) = load(dir.path());
    // The stub consumes the driver script on stdin (proving the
    // redirection) and prints a CPLEX-shaped solution.
    let stub = write_stub(
        dir.path(),
        "fake-cplex",
        "#!/bin/sh\ngrep -q treememory || exit 3\n\
         echo 'MIP - Integer optimal solution:  Objective =  1.0'\n\
         echo 'Variable Name           Solution Value'\n\
         echo 'x_1,7                   1.000000'\n\
         echo 'All other variables in the range 1-4 are 0.'\n",
    );
    let config = SolverConfig { sat_solver: None, mip_solver: Some(stub) };
    let mut namer = TempNamer::from_seed(4);
    let outcome = solve(&mut inst, Backend::Mip, &config, &problem_path, &mut namer, false).unwrap();
    assert!(outcome.satisfiable);
    assert_eq!(outcome.objective, Some(1.0));
    assert_eq!(outcome.matching.get(&ResidentId(1)), Some(&HospitalId(7)));
    assert!(!outcome.matching.contains_key(&ResidentId(2)));
    assert_eq!(leftover_temps(dir.path()), Vec::<String>::new());
}

#[test]
fn mip_without_variable_section_is_infeasible() {
    let dir = tempfile::tempdir().unwrap();
    let (mut inst, problem_path) = load(dir.path());
    let stub = write_stub(
        dir.path(),
        "fake-cplex",
        "#!/bin/sh\necho 'MIP - Integer infeasible.'\n",
    );
    let config = SolverConfig { sat_solver: None, mip_solver: Some(stub) };
    let mut namer = TempNamer::from_seed(6);
    let outcome = solve(&mut inst, Backend::Mip, &config, &problem_path, &mut namer, false).unwrap();
    assert!(!outcome.satisfiable);
    assert!(outcome.matching.is_empty());
}

#[test]
fn missing_solver_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (mut inst, problem_path) = load(dir.path());
    let config = SolverConfig::default();
    let mut namer = TempNamer::from_seed(8);
    let err = solve(&mut inst, Backend::Sat, &config, &problem_path, &mut namer, false).unwrap_err();
    assert!(err.to_string().contains("SAT_SOLVER_PATH"), "{err}");
}
