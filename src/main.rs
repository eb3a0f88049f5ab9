#![forbid(unsafe_code)]

use std::path::Path;
use std::process::exit;

use saphyr_wire::budget::BudgetReport;
use saphyr_wire::{expansion_stages, from_str_with_options, Options, PathTable, Visitor};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: saphyr-wire [--budget] <file>\n\n\
Loads a YAML configuration, expands its `{{ }}` tokens and document includes, \
and prints every leaf as `<path>, <value>`. Also usable as a validator.\n\n\
Options:\n  --budget    print the budget report for the top-level document\n  -h, --help  print this help";

fn report_budget(report: &BudgetReport) {
    eprintln!("Budget report:\n{report:#?}");
}

struct Args {
    path: String,
    budget: bool,
}

fn parse_args() -> Args {
    let mut path = None;
    let mut budget = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                exit(0);
            }
            "--budget" => budget = true,
            option if option.starts_with('-') && option.len() > 1 => {
                eprintln!("Unknown option: {option}\n\n{USAGE}");
                exit(1);
            }
            _ if path.is_some() => {
                eprintln!("Unexpected extra argument: {arg}\n\n{USAGE}");
                exit(1);
            }
            _ => path = Some(arg),
        }
    }
    match path {
        Some(path) => Args { path, budget },
        None => {
            eprintln!("{USAGE}");
            exit(1);
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "miette")]
fn print_diagnostic(err: saphyr_wire::Error, content: &str, path: &str) {
    eprintln!("{path} invalid:");
    eprintln!("{:?}", saphyr_wire::miette::to_miette_report(err, content, path));
}

#[cfg(not(feature = "miette"))]
fn print_diagnostic(err: saphyr_wire::Error, _content: &str, path: &str) {
    eprintln!("{path} invalid:\n{err}");
}

/// Prints the path table of a YAML configuration after template and include expansion.
/// Exit codes: 1 for usage errors, 2 when the file cannot be read, 3 when it is invalid.
fn main() {
    let args = parse_args();
    init_logging();

    let content = match std::fs::read_to_string(&args.path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Failed to read {}: {err}", args.path);
            exit(2);
        }
    };

    let options = Options {
        budget_report: args.budget.then_some(report_budget as fn(&BudgetReport)),
        ..Options::default()
    };

    let table = from_str_with_options(&content, &options).and_then(|document| {
        let expanded = expansion_stages(Path::new(&args.path), &options).visit(&document)?;
        PathTable::new().render(&expanded)
    });

    match table {
        Ok(table) => print!("{table}"),
        Err(err) => {
            print_diagnostic(err, &content, &args.path);
            exit(3);
        }
    }
}
