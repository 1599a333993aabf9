//! Scoped timers.

use std::sync::Weak;
use std::time::Instant;

use crate::{CaptureSession, Engine, Tag};

/// A tracked span of code, measured from creation until it is closed or dropped.
///
/// Obtained from [`Engine::timer()`]. If no capture was active when the timer was created,
/// the handle is inert: it holds no tag, no timestamp and no allocation, and closing it does
/// nothing.
///
/// The measurement is submitted when the handle is closed, either explicitly via
/// [`close()`](Self::close) or implicitly when it is dropped (including during unwinding).
/// The sample is only recorded if the capture that created the handle is still within its
/// window at that moment. Otherwise it is silently dropped.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scope_watch::Engine;
///
/// let engine = Engine::new();
///
/// // No capture is running, so this is free and records nothing.
/// let timer = engine.timer(&["startup"]);
/// assert!(timer.is_inert());
/// drop(timer);
///
/// engine.start_capture(Duration::from_secs(10)).unwrap();
///
/// {
///     let _timer = engine.timer(&["hooks", "on_tick"]);
///     // Work measured until the end of the scope.
/// }
/// ```
#[derive(Debug)]
#[must_use = "Measurements are taken between creation and drop"]
pub struct TimerHandle<'e> {
    running: Option<RunningTimer<'e>>,
}

#[derive(Debug)]
struct RunningTimer<'e> {
    engine: &'e Engine,
    session: Weak<CaptureSession>,
    tag: Tag,
    started_at: Instant,
}

impl<'e> TimerHandle<'e> {
    /// A handle that measures nothing.
    pub const fn inert() -> Self {
        Self { running: None }
    }

    pub(crate) fn start(
        engine: &'e Engine,
        session: Weak<CaptureSession>,
        tag: Tag,
        started_at: Instant,
    ) -> Self {
        Self {
            running: Some(RunningTimer {
                engine,
                session,
                tag,
                started_at,
            }),
        }
    }

    /// Whether this handle is inert or already closed.
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.running.is_none()
    }

    /// The tag the measurement will be recorded under, if the handle is still running.
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        self.running.as_ref().map(|running| &running.tag)
    }

    /// Ends the measurement and submits the sample.
    ///
    /// Closing an inert or already closed handle does nothing.
    pub fn close(&mut self) {
        if let Some(running) = self.running.take() {
            running
                .engine
                .complete(&running.session, running.tag, running.started_at);
        }
    }
}

impl Drop for TimerHandle<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::{ManualClock, Report};

    static_assertions::assert_impl_all!(TimerHandle<'static>: Send, Sync);

    fn engine_with_reports(clock: &ManualClock) -> (Engine, Arc<Mutex<Vec<Report>>>) {
        let reports = Arc::new(Mutex::new(Vec::new()));

        let engine = Engine::builder()
            .clock(clock.clone())
            .sink({
                let reports = Arc::clone(&reports);
                move |report: &Report| reports.lock().unwrap().push(report.clone())
            })
            .build();

        (engine, reports)
    }

    #[test]
    fn inert_handle_has_no_tag() {
        let handle = TimerHandle::inert();

        assert!(handle.is_inert());
        assert!(handle.tag().is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let clock = ManualClock::new();
        let (engine, reports) = engine_with_reports(&clock);
        engine.start_capture(Duration::from_millis(100)).unwrap();

        let mut timer = engine.timer(&["A"]);
        assert_eq!(timer.tag().unwrap().as_str(), "A");

        clock.advance(Duration::from_millis(10));
        timer.close();
        assert!(timer.is_inert());

        clock.advance(Duration::from_millis(10));
        timer.close();
        drop(timer);

        clock.advance(Duration::from_millis(100));
        let report = engine.tick().unwrap();

        assert_eq!(report.total().count(), 1);
        assert_eq!(report.total().cumulative(), Duration::from_millis(10));
        assert_eq!(reports.lock().unwrap().len(), 1);
    }

    #[test]
    fn drop_during_unwind_records_sample() {
        let clock = ManualClock::new();
        let (engine, _reports) = engine_with_reports(&clock);
        engine.start_capture(Duration::from_millis(100)).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _timer = engine.timer(&["panicky"]);
            clock.advance(Duration::from_millis(5));
            panic!("scope terminated abnormally");
        }));
        assert!(result.is_err());

        clock.advance(Duration::from_millis(100));
        let report = engine.tick().unwrap();

        let row = report.row("panicky").unwrap();
        assert_eq!(row.stats().count(), 1);
        assert_eq!(row.stats().cumulative(), Duration::from_millis(5));
    }

    #[test]
    fn nested_timers_are_independent_samples() {
        let clock = ManualClock::new();
        let (engine, _reports) = engine_with_reports(&clock);
        engine.start_capture(Duration::from_secs(1)).unwrap();

        {
            let _outer = engine.timer(&["A"]);
            clock.advance(Duration::from_millis(10));
            {
                let _inner = engine.timer(&["A", "B"]);
                clock.advance(Duration::from_millis(20));
                {
                    let _same_tag = engine.timer(&["A"]);
                    clock.advance(Duration::from_millis(5));
                }
            }
        }

        clock.advance(Duration::from_secs(1));
        let report = engine.tick().unwrap();

        let outer = report.row("A").unwrap().stats();
        assert_eq!(outer.count(), 2);
        assert_eq!(outer.max(), Duration::from_millis(35));
        assert_eq!(outer.min(), Duration::from_millis(5));

        let inner = report.row("A::B").unwrap().stats();
        assert_eq!(inner.count(), 1);
        assert_eq!(inner.cumulative(), Duration::from_millis(25));

        assert_eq!(report.total().count(), 3);
    }
}
