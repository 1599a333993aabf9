#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the `scope_watch` tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io;
use std::process::ExitCode;

use argh::FromArgs;
use scope_watch::OverlapPolicy;
use scope_watch_cli::{RunInput, run};
use tracing::Level;

/// Number of worker threads when not specified on the command line.
const DEFAULT_WORKERS: usize = 4;

/// Runs a synthetic multithreaded workload, captures its timings for the requested number of
/// milliseconds and prints the report.
#[derive(FromArgs)]
struct Args {
    /// restart a running capture when another capture is requested, instead of rejecting
    /// the request
    #[argh(switch)]
    restart: bool,

    /// log engine lifecycle events in detail
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// number of worker threads producing samples (default 4)
    #[argh(option)]
    workers: Option<usize>,

    /// capture lengths in milliseconds; each is requested in turn once the workload is running
    #[argh(positional, greedy)]
    captures: Vec<String>,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .with_writer(io::stderr)
        .init();

    let input = RunInput {
        captures: args.captures,
        overlap_policy: if args.restart {
            OverlapPolicy::Restart
        } else {
            OverlapPolicy::Reject
        },
        workers: args.workers.unwrap_or(DEFAULT_WORKERS),
    };

    match run(&input) {
        Ok(outcome) => {
            for rejection in &outcome.rejected {
                eprintln!("Rejected: {rejection}");
            }

            println!("{}", outcome.report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
