use std::{env::args, path::Path, process};

use log::debug;
use pretty_env_logger::formatted_builder;
use purity::{
    config::{Backtrack, Config},
    formula::{Cnf, Model},
    parser::{self, parse_file},
    report::Report,
    solver::{DpllSolver, Solver, TrailSolver},
};

/// Exit code of a run that declared more variables than the configured capacity.
const CAPACITY_EXIT_CODE: i32 = 2;

fn usage_string() -> String {
    format!(
        "Usage: {} <file_name>

Environment:
    PURITY_MAX_VARIABLES - maximum number of variables (default {})
    PURITY_BACKTRACK     - backtracking strategy, copy or trail (default copy)",
        args().next().unwrap_or_else(|| "purity".to_owned()),
        Config::DEFAULT_MAX_VARIABLES,
    )
}

fn solve_with<T: Solver>(formula: Cnf) -> Option<Model> {
    T::new(formula).solve()
}

fn load(path: &Path, config: &Config) -> Result<Cnf, Report> {
    match parse_file(path, config.max_variables) {
        Ok(formula) => Ok(formula),
        Err(e @ parser::Error::TooManyVariables { .. }) => {
            println!("{}", e);
            process::exit(CAPACITY_EXIT_CODE);
        }
        Err(e) => Err(e.into()),
    }
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("purity=debug");
    } else {
        builder.parse_filters("purity=warn");
    }

    builder.try_init().expect("Failed to initialize the logger");
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            println!("{}", usage_string());
            process::exit(1);
        }
    };

    let config = Config::from_env()?;
    debug!("{:?}", config);

    let formula = load(path.as_ref(), &config)?;
    let result = match config.backtrack {
        Backtrack::Copy => solve_with::<DpllSolver>(formula),
        Backtrack::Trail => solve_with::<TrailSolver>(formula),
    };

    match result {
        Some(model) => println!("{}", model),
        None => println!("UNSAT"),
    }

    Ok(())
}
