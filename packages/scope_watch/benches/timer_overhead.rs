//! Benchmarking the cost of creating and closing timers.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::slice;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use scope_watch::{Engine, Instrumentation, Report};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

// Long enough to never elapse during a benchmark run.
const CAPTURE_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope_watch_timer");

    let unavailable = Instrumentation::Unavailable;

    group.bench_function("unavailable", |b| {
        b.iter(|| drop(black_box(unavailable.timer(&["hot", "path"]))));
    });

    let idle = Engine::builder().sink(|_: &Report| {}).build();

    group.bench_function("idle", |b| {
        b.iter(|| drop(black_box(idle.timer(&["hot", "path"]))));
    });

    let active = Engine::builder().sink(|_: &Report| {}).build();
    active
        .start_capture(CAPTURE_WINDOW)
        .expect("fresh engine accepts a capture");

    group.bench_function("active_single_tag", |b| {
        b.iter(|| drop(black_box(active.timer(&["hot", "path"]))));
    });

    let segments = (0..64).map(|i| format!("tag_{i}")).collect::<Vec<_>>();
    let mut rotation = segments.iter().cycle();

    group.bench_function("active_many_tags", |b| {
        b.iter(|| {
            let segment = rotation.next().expect("cycle over non-empty list never ends");
            drop(black_box(active.timer(slice::from_ref(segment))));
        });
    });

    group.finish();
}
