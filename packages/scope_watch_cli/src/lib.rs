#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Drives a synthetic multithreaded workload through a `scope_watch` engine and collects the
//! report of the capture requested on the command line.
//!
//! This crate provides the core logic, exposed via the [`run`] function.
//! The binary entry point is in `main.rs`.

use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use scope_watch::{CaptureCommand, Engine, Instrumentation, OverlapPolicy, Report};
use tracing::{debug, warn};

/// How often the waiting thread checks for an elapsed window that no worker has noticed.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// How long a worker sleeps in the "io" part of each iteration.
const SIMULATED_IO: Duration = Duration::from_micros(200);

/// Input parameters for the `run` function.
///
/// This is the parsed input that the core logic operates on.
#[doc(hidden)]
#[derive(Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "This is a hidden struct for internal/test use only"
)]
pub struct RunInput {
    /// Capture lengths in milliseconds, issued in order right after the workload starts.
    pub captures: Vec<String>,

    /// What to do with capture requests that arrive while a capture is running.
    pub overlap_policy: OverlapPolicy,

    /// Number of worker threads running the synthetic workload.
    pub workers: usize,
}

/// The outcome of a successful run.
#[doc(hidden)]
#[derive(Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "This is a hidden struct for internal/test use only"
)]
pub struct RunOutcome {
    /// The report of the capture that ran to completion.
    pub report: Report,

    /// Capture requests that the engine refused, in the order they were issued.
    pub rejected: Vec<scope_watch::Error>,
}

/// Errors that end a run without a report.
#[doc(hidden)]
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RunError {
    /// A capture length on the command line could not be parsed.
    #[error(transparent)]
    InvalidCapture(#[from] scope_watch::Error),

    /// No capture length was given.
    #[error("at least one capture length (in milliseconds) is required")]
    NoCaptureRequested,

    /// At least one worker thread is required to produce samples.
    #[error("at least one worker thread is required")]
    NoWorkers,
}

/// Core logic of the tool, extracted for testability.
///
/// Starts the workers, issues every requested capture and waits until one capture has
/// finished, then stops the workers and returns its report.
#[doc(hidden)]
pub fn run(input: &RunInput) -> Result<RunOutcome, RunError> {
    // Everything is validated before the workload starts.
    let commands = input
        .captures
        .iter()
        .map(|argument| CaptureCommand::parse(argument))
        .collect::<Result<Vec<_>, _>>()?;

    if commands.is_empty() {
        return Err(RunError::NoCaptureRequested);
    }

    if input.workers == 0 {
        return Err(RunError::NoWorkers);
    }

    let (report_tx, report_rx) = mpsc::channel::<Report>();

    let engine = Arc::new(
        Engine::builder()
            .overlap_policy(input.overlap_policy)
            .sink(move |report: &Report| {
                // The receiver only goes away once we have what we came for.
                _ = report_tx.send(report.clone());
            })
            .build(),
    );

    let stop = Arc::new(AtomicBool::new(false));

    // Workers and the issuing thread all start together, so every capture sees a busy engine.
    let start = Arc::new(Barrier::new(input.workers.saturating_add(1)));

    let workers = (0..input.workers)
        .map(|index| {
            let instrumentation = Instrumentation::from(Arc::clone(&engine));
            let stop = Arc::clone(&stop);
            let start = Arc::clone(&start);

            thread::spawn(move || {
                start.wait();
                run_worker(index, &instrumentation, &stop);
            })
        })
        .collect::<Vec<_>>();

    start.wait();

    let mut rejected = Vec::new();

    for command in &commands {
        match command.execute(&engine) {
            Ok(()) => debug!(window = ?command.window(), "capture requested"),
            Err(e) => {
                warn!(window = ?command.window(), error = %e, "capture request refused");
                rejected.push(e);
            }
        }
    }

    let report = loop {
        match report_rx.recv_timeout(TICK_INTERVAL) {
            Ok(report) => break report,
            Err(RecvTimeoutError::Timeout) => {
                // Delivered via the sink if the window has ended.
                _ = engine.tick();
            }
            Err(RecvTimeoutError::Disconnected) => {
                unreachable!("the engine owns the sender and outlives this loop")
            }
        }
    };

    stop.store(true, Ordering::Relaxed);

    for worker in workers {
        worker
            .join()
            .expect("workload threads do not panic");
    }

    Ok(RunOutcome { report, rejected })
}

fn run_worker(index: usize, instrumentation: &Instrumentation, stop: &AtomicBool) {
    let lane = format!("lane_{index}");

    while !stop.load(Ordering::Relaxed) {
        let _iteration = instrumentation.timer(&["worker", "iteration"]);

        let checksum = instrumentation.measure(&["worker", "compute"], || {
            (0..2_000_u64).fold(0_u64, |acc, x| acc.wrapping_mul(31).wrapping_add(x))
        });
        black_box(checksum);

        instrumentation.measure(&["worker", "io"], || thread::sleep(SIMULATED_IO));

        // Every worker also reports under a tag of its own.
        let _lane = instrumentation.timer(&["worker", lane.as_str()]);
        black_box(lane.len());
    }
}
