//! Example that demonstrates capturing timings of a small workload.
//!
//! A capture is started for a short window, instrumented code runs until the window is over
//! and the report is printed to the terminal.

use std::hint::black_box;
use std::thread;
use std::time::{Duration, Instant};

use scope_watch::{Engine, Report};

fn main() {
    println!("=== scope_watch Basic Example ===");

    let engine = Engine::builder()
        .sink(|report: &Report| println!("{report}"))
        .build();

    // Before the capture starts, timers are inert and nothing is recorded.
    drop(engine.timer(&["ignored"]));

    engine
        .start_capture(Duration::from_millis(200))
        .expect("a fresh engine has no capture running");

    let deadline = Instant::now()
        .checked_add(Duration::from_millis(250))
        .expect("deadline is within the range of the monotonic clock");

    while Instant::now() < deadline {
        let _frame = engine.timer(&["frame"]);

        engine.measure(&["frame", "simulate"], || {
            black_box((0..10_000_u64).map(|x| x.wrapping_mul(x)).sum::<u64>())
        });

        {
            let _render = engine.timer(&["frame", "render"]);
            thread::sleep(Duration::from_millis(2));
        }
    }

    // The loop ran past the end of the window, so the report has been printed by now.
    assert!(!engine.is_active());

    println!("Example completed successfully!");
}
