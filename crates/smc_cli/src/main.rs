// crates/smc_cli/src/main.rs
//
// `smp_c` — stable matching with couples through an external MIP or SAT
// solver. Strictly offline; the only processes spawned are the solver
// binaries named by SAT_SOLVER_PATH / CPLEX_PATH.
//
// Exit policy: nonzero iff the input is rejected, the solver configuration
// is missing, or the solver run itself fails. An UNSAT instance exits 0
// and writes an empty matching (`m 0`).

mod args;

use args::parse_and_validate;
use smc_io::matching::{load_matching, write_matching};
use smc_io::problem::{load_problem, LoadOptions};
use smc_pipeline::harness::{SolverConfig, TempNamer};
use smc_pipeline::{formulate, solve, verify};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("smp_c: error: {e}");
            return ExitCode::from(1);
        }
    };
    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("smp_c: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: args::Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let backend = args.solver.backend();
    let opts = LoadOptions { append_nil: args.append_nil };
    let mut inst = load_problem(&args.problem, opts)?;
    let output = args.resolve_output();

    if let Some(matching_path) = &args.verify {
        let matching = load_matching(matching_path)?;
        let violations = verify(&inst, backend, &matching)?;
        if violations.is_empty() {
            println!("matching is stable");
        } else {
            println!("matching is not stable; {} violated:", violations.len());
            for v in &violations {
                println!("{v}");
            }
        }
        return Ok(ExitCode::from(0));
    }

    let mut namer = TempNamer::new();
    if args.formulate {
        formulate(&inst, backend, &output, &mut namer, args.verbose)?;
        return Ok(ExitCode::from(0));
    }

    let config = SolverConfig::from_env();
    let outcome = solve(&mut inst, backend, &config, &args.problem, &mut namer, args.verbose)?;
    write_matching(&outcome.matching, &output, None)?;
    if !outcome.satisfiable {
        eprintln!("smp_c: no stable matching exists; wrote empty matching");
    }
    Ok(ExitCode::from(0))
}
