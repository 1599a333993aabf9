use std::any::type_name;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    BoxedSink, CaptureSession, Clock, EngineBuilder, Error, Report, Result, SubmitOutcome, Tag,
    TimerHandle,
};

/// What to do when a capture is requested while another one is still running.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum OverlapPolicy {
    /// Refuse the request with [`Error::CaptureAlreadyActive`]. The running capture continues.
    #[default]
    Reject,

    /// Discard everything recorded by the running capture (no report is produced for it)
    /// and start a fresh window.
    Restart,
}

/// Externally visible state of the engine.
#[expect(
    clippy::exhaustive_enums,
    reason = "a capture either runs or it does not"
)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CaptureState {
    /// No samples are being aggregated. Timers are inert.
    Idle,

    /// A capture window is running.
    Active {
        /// Time left until the window ends.
        remaining: Duration,
    },
}

/// The instrumentation engine: owns the current capture (if any) and hands out timers.
///
/// While idle, [`timer()`](Self::timer) returns inert handles without allocating, so
/// instrumentation can stay in hot code permanently. While a capture is active, every
/// closed timer contributes a sample to the statistics of its tag. When the capture
/// window elapses, the engine renders a [`Report`] and hands it to the configured
/// [`ReportSink`](crate::ReportSink), then returns to idle.
///
/// The engine has no thread of its own. The end of a window is noticed by the next
/// timer created or closed after it, or by the host calling [`tick()`](Self::tick).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scope_watch::{Engine, ManualClock, Report};
///
/// let clock = ManualClock::new();
/// let engine = Engine::builder()
///     .clock(clock.clone())
///     .sink(|report: &Report| println!("{report}"))
///     .build();
///
/// engine.start_capture(Duration::from_millis(100)).unwrap();
///
/// {
///     let _timer = engine.timer(&["A", "B"]);
///     clock.advance(Duration::from_millis(50));
/// }
///
/// clock.advance(Duration::from_millis(50));
/// let report = engine.tick().unwrap();
///
/// assert_eq!(report.row("A::B").unwrap().stats().count(), 1);
/// ```
pub struct Engine {
    current: ArcSwapOption<CaptureSession>,

    // Serializes starting and finalizing captures. Never taken on the timer hot path.
    transitions: Mutex<Transitions>,

    clock: Clock,
    overlap_policy: OverlapPolicy,
    sink: BoxedSink,
}

impl Engine {
    /// Creates an engine with the default configuration: real clock, overlapping
    /// captures rejected, reports written to the log.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a new engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub(crate) fn from_builder(
        clock: Clock,
        overlap_policy: OverlapPolicy,
        sink: BoxedSink,
    ) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            transitions: Mutex::new(Transitions::default()),
            clock,
            overlap_policy,
            sink,
        }
    }

    /// Starts capturing for `window`.
    ///
    /// If a previous capture has already run out but was not yet finalized, it is finalized
    /// first and its report delivered. If a previous capture is still running, the configured
    /// [`OverlapPolicy`] decides.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDuration`] if `window` is zero or too long to represent.
    ///
    /// [`Error::CaptureAlreadyActive`] if a capture is running and the policy is
    /// [`OverlapPolicy::Reject`].
    pub fn start_capture(&self, window: Duration) -> Result<()> {
        if window.is_zero() {
            return Err(Error::InvalidDuration {
                value: format!("{window:?}"),
                problem: "capture window must be longer than zero".to_string(),
            });
        }

        let now = self.clock.now();

        let window_end = now.checked_add(window).ok_or_else(|| Error::InvalidDuration {
            value: format!("{window:?}"),
            problem: "capture window is too long to represent".to_string(),
        })?;

        let expired_report = {
            let mut transitions = self.transitions.lock();

            let expired_report = match self.current.load_full() {
                Some(running) if running.is_elapsed(now) => self.finalize_locked(&running),
                Some(running) => match self.overlap_policy {
                    OverlapPolicy::Reject => {
                        let remaining = running.remaining(now);
                        debug!(session = running.id(), ?remaining, "capture request rejected");
                        return Err(Error::CaptureAlreadyActive { remaining });
                    }
                    OverlapPolicy::Restart => {
                        running.close();
                        debug!(session = running.id(), "capture restarted, samples discarded");
                        None
                    }
                },
                None => None,
            };

            transitions.last_session_id = transitions.last_session_id.wrapping_add(1);
            let session_id = transitions.last_session_id;

            self.current
                .store(Some(Arc::new(CaptureSession::new(session_id, window, window_end))));

            info!(session = session_id, ?window, "capture started");

            expired_report
        };

        if let Some(report) = expired_report {
            self.sink.0.deliver(&report);
        }

        Ok(())
    }

    /// Creates a timer for the tag formed by joining `segments` with `::`.
    ///
    /// Returns an inert handle (without allocating) if no capture is active.
    pub fn timer<S>(&self, segments: &[S]) -> TimerHandle<'_>
    where
        S: AsRef<str>,
    {
        let current = self.current.load();

        let Some(session) = &*current else {
            return TimerHandle::inert();
        };

        let now = self.clock.now();

        if session.is_elapsed(now) {
            let session = Arc::clone(session);
            drop(current);

            self.finalize(&session);
            return TimerHandle::inert();
        }

        TimerHandle::start(
            self,
            Arc::downgrade(session),
            Tag::from_segments(segments),
            now,
        )
    }

    /// Measures the execution of `f` under the tag formed by `segments`, returning its result.
    ///
    /// Equivalent to holding a [`timer()`](Self::timer) for the duration of the call.
    pub fn measure<S, R, F>(&self, segments: &[S], f: F) -> R
    where
        S: AsRef<str>,
        F: FnOnce() -> R,
    {
        let _timer = self.timer(segments);
        f()
    }

    /// Finalizes the current capture if its window has elapsed, returning the report
    /// (which is also delivered to the sink).
    ///
    /// Hosts with a periodic callback can call this to end captures promptly even when
    /// no instrumented code runs after the window ends.
    pub fn tick(&self) -> Option<Report> {
        let session = self.current.load_full()?;

        if !session.is_elapsed(self.clock.now()) {
            return None;
        }

        self.finalize(&session)
    }

    /// The current state of the engine.
    ///
    /// A capture whose window has elapsed is reported as idle even before it has been
    /// finalized, because it no longer accepts samples.
    #[must_use]
    pub fn state(&self) -> CaptureState {
        let current = self.current.load();

        match &*current {
            Some(session) => {
                let remaining = session.remaining(self.clock.now());

                if remaining.is_zero() {
                    CaptureState::Idle
                } else {
                    CaptureState::Active { remaining }
                }
            }
            None => CaptureState::Idle,
        }
    }

    /// Whether a capture window is currently running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state(), CaptureState::Active { .. })
    }

    /// Submits the sample of a timer that was started at `started_at`.
    pub(crate) fn complete(&self, session: &Weak<CaptureSession>, tag: Tag, started_at: Instant) {
        // The session is gone once it has been finalized and replaced.
        let Some(session) = session.upgrade() else {
            return;
        };

        let now = self.clock.now();

        match session.submit(tag, Clock::elapsed(started_at, now), now) {
            SubmitOutcome::Recorded | SubmitOutcome::Closed => {}
            SubmitOutcome::WindowElapsed => {
                self.finalize(&session);
            }
        }
    }

    /// Finalizes `session` if it is still the current session and delivers its report.
    fn finalize(&self, session: &Arc<CaptureSession>) -> Option<Report> {
        let report = {
            let _transition = self.transitions.lock();
            self.finalize_locked(session)
        };

        // Delivered outside the lock so that the sink is free to start a new capture.
        if let Some(report) = &report {
            self.sink.0.deliver(report);
        }

        report
    }

    /// Closes `session` and produces its report. Caller must hold `transitions`.
    ///
    /// Returns `None` if another thread already finalized or replaced the session.
    fn finalize_locked(&self, session: &Arc<CaptureSession>) -> Option<Report> {
        let is_current = (*self.current.load())
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, session));

        if !is_current || !session.close() {
            return None;
        }

        self.current.store(None);

        let report = session.to_report();

        info!(
            session = session.id(),
            window = ?session.window(),
            samples = report.total().count(),
            tags = report.rows().count(),
            "capture finished"
        );

        Some(report)
    }
}

#[derive(Debug, Default)]
struct Transitions {
    // Only used to tell sessions apart in the log.
    last_session_id: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("state", &self.state())
            .field("overlap_policy", &self.overlap_policy)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{ManualClock, MockReportSink};

    static_assertions::assert_impl_all!(Engine: Send, Sync);

    fn engine(clock: &ManualClock, policy: OverlapPolicy) -> Engine {
        Engine::builder()
            .clock(clock.clone())
            .overlap_policy(policy)
            .sink(|_: &Report| {})
            .build()
    }

    #[test]
    fn idle_engine_hands_out_inert_timers() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        assert_eq!(engine.state(), CaptureState::Idle);

        let timer = engine.timer(&["A", "B"]);
        assert!(timer.is_inert());
        drop(timer);

        assert!(engine.tick().is_none());
        assert!(engine.current.load().is_none());
    }

    #[test]
    fn zero_window_is_invalid() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        let result = engine.start_capture(Duration::ZERO);
        assert!(matches!(result, Err(Error::InvalidDuration { .. })));
        assert_eq!(engine.state(), CaptureState::Idle);
    }

    #[test]
    fn unrepresentable_window_is_invalid() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        let result = engine.start_capture(Duration::MAX);
        assert!(matches!(result, Err(Error::InvalidDuration { .. })));
    }

    #[test]
    fn active_state_counts_down() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        engine.start_capture(Duration::from_millis(100)).unwrap();
        clock.advance(Duration::from_millis(30));

        assert_eq!(
            engine.state(),
            CaptureState::Active {
                remaining: Duration::from_millis(70)
            }
        );
        assert!(engine.is_active());

        clock.advance(Duration::from_millis(70));
        assert_eq!(engine.state(), CaptureState::Idle);
        assert!(!engine.is_active());
    }

    #[test]
    fn reject_policy_keeps_running_capture() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        engine.start_capture(Duration::from_millis(100)).unwrap();
        engine.measure(&["kept"], || clock.advance(Duration::from_millis(10)));

        let result = engine.start_capture(Duration::from_millis(500));
        match result {
            Err(Error::CaptureAlreadyActive { remaining }) => {
                assert_eq!(remaining, Duration::from_millis(90));
            }
            other => panic!("expected rejection, got {other:?}"),
        }

        clock.advance(Duration::from_millis(90));
        let report = engine.tick().unwrap();

        assert_eq!(report.window(), Duration::from_millis(100));
        assert_eq!(report.row("kept").unwrap().stats().count(), 1);
    }

    #[test]
    fn restart_policy_discards_previous_samples() {
        let clock = ManualClock::new();
        let delivered = Arc::new(AtomicUsize::new(0));

        let engine = Engine::builder()
            .clock(clock.clone())
            .overlap_policy(OverlapPolicy::Restart)
            .sink({
                let delivered = Arc::clone(&delivered);
                move |_: &Report| {
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
            })
            .build();

        engine.start_capture(Duration::from_millis(100)).unwrap();
        engine.measure(&["discarded"], || clock.advance(Duration::from_millis(10)));

        // A timer opened in the first window and closed in the second one is dropped.
        let straddling = engine.timer(&["straddling"]);

        engine.start_capture(Duration::from_millis(200)).unwrap();
        engine.measure(&["kept"], || clock.advance(Duration::from_millis(20)));
        drop(straddling);

        // No report for the discarded window.
        assert_eq!(delivered.load(Ordering::Relaxed), 0);

        clock.advance(Duration::from_millis(200));
        let report = engine.tick().unwrap();

        assert_eq!(delivered.load(Ordering::Relaxed), 1);
        assert_eq!(report.window(), Duration::from_millis(200));
        assert!(report.row("discarded").is_none());
        assert!(report.row("straddling").is_none());
        assert_eq!(report.row("kept").unwrap().stats().count(), 1);
        assert_eq!(report.total().count(), 1);
    }

    #[test]
    fn starting_after_unfinalized_expiry_delivers_old_report() {
        let clock = ManualClock::new();

        let mut sink = MockReportSink::new();
        sink.expect_deliver()
            .withf(|report| report.window() == Duration::from_millis(100) && report.total().count() == 1)
            .times(1)
            .return_const(());

        let engine = Engine::builder()
            .clock(clock.clone())
            .sink(sink)
            .build();

        engine.start_capture(Duration::from_millis(100)).unwrap();
        engine.measure(&["first"], || clock.advance(Duration::from_millis(10)));

        clock.advance(Duration::from_millis(200));

        // Rejection policy does not apply - the previous window is already over.
        engine.start_capture(Duration::from_millis(100)).unwrap();
        assert!(engine.is_active());
    }

    #[test]
    fn expiry_detected_when_creating_timer() {
        let clock = ManualClock::new();

        let mut sink = MockReportSink::new();
        sink.expect_deliver().times(1).return_const(());

        let engine = Engine::builder().clock(clock.clone()).sink(sink).build();

        engine.start_capture(Duration::from_millis(100)).unwrap();
        clock.advance(Duration::from_millis(100));

        let timer = engine.timer(&["late"]);
        assert!(timer.is_inert());
        assert!(engine.current.load().is_none());

        // Already finalized - nothing further to deliver.
        assert!(engine.tick().is_none());
    }

    #[test]
    fn expiry_detected_when_closing_timer() {
        let clock = ManualClock::new();

        let mut sink = MockReportSink::new();
        sink.expect_deliver()
            .withf(|report| report.is_empty())
            .times(1)
            .return_const(());

        let engine = Engine::builder().clock(clock.clone()).sink(sink).build();

        engine.start_capture(Duration::from_millis(100)).unwrap();

        let timer = engine.timer(&["in_flight"]);
        clock.advance(Duration::from_millis(150));
        drop(timer);

        assert!(engine.current.load().is_none());
        assert_eq!(engine.state(), CaptureState::Idle);
    }

    #[test]
    fn tick_before_expiry_does_nothing() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Reject);

        engine.start_capture(Duration::from_millis(100)).unwrap();
        clock.advance(Duration::from_millis(99));

        assert!(engine.tick().is_none());
        assert!(engine.is_active());
    }

    #[test]
    fn sink_may_start_next_capture() {
        let clock = ManualClock::new();

        let engine = Arc::new_cyclic(|weak: &Weak<Engine>| {
            let weak = weak.clone();
            Engine::builder()
                .clock(clock.clone())
                .sink(move |report: &Report| {
                    if report.window() == Duration::from_millis(100) {
                        if let Some(engine) = weak.upgrade() {
                            engine.start_capture(Duration::from_millis(50)).unwrap();
                        }
                    }
                })
                .build()
        });

        engine.start_capture(Duration::from_millis(100)).unwrap();
        clock.advance(Duration::from_millis(100));
        engine.tick().unwrap();

        assert_eq!(
            engine.state(),
            CaptureState::Active {
                remaining: Duration::from_millis(50)
            }
        );
    }

    #[test]
    fn debug_output_shows_state() {
        let clock = ManualClock::new();
        let engine = engine(&clock, OverlapPolicy::Restart);

        let debug = format!("{engine:?}");
        assert!(debug.contains("Idle"), "{debug}");
        assert!(debug.contains("Restart"), "{debug}");
    }
}
