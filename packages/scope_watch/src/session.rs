use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::{Registry, Report, StatsCell, Tag};

/// One capture window and everything recorded during it.
///
/// A session is created in the active state by the engine and can be closed exactly once.
/// After it is closed, no further samples are accepted and the recorded data is frozen.
#[derive(Debug)]
pub(crate) struct CaptureSession {
    id: u64,

    window: Duration,
    window_end: Instant,

    // `true` while the session accepts samples. Submissions hold the shared side while
    // recording, closing takes the exclusive side. This makes closing a single point that
    // every submission is either entirely before or entirely after.
    gate: RwLock<bool>,

    registry: Registry,

    // Aggregate over all samples regardless of tag, rendered as the Total row.
    frame: StatsCell,
}

/// What happened to a sample offered to a session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SubmitOutcome {
    /// The sample is part of the session data.
    Recorded,

    /// The sample arrived at or after the end of the window and was dropped.
    /// The session is still open and should be finalized.
    WindowElapsed,

    /// The session was already closed and the sample was dropped.
    Closed,
}

impl CaptureSession {
    /// Creates an open session whose window ends at `window_end`.
    pub(crate) fn new(id: u64, window: Duration, window_end: Instant) -> Self {
        Self {
            id,
            window,
            window_end,
            gate: RwLock::new(true),
            registry: Registry::new(),
            frame: StatsCell::new(),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }

    /// Whether the window has run out at `now`. The window is half-open: a sample
    /// closing exactly at the window end is already outside of it.
    pub(crate) fn is_elapsed(&self, now: Instant) -> bool {
        now >= self.window_end
    }

    pub(crate) fn remaining(&self, now: Instant) -> Duration {
        self.window_end.saturating_duration_since(now)
    }

    /// Offers a sample completed at `now` to the session.
    pub(crate) fn submit(&self, tag: Tag, sample: Duration, now: Instant) -> SubmitOutcome {
        let open = self.gate.read();

        if !*open {
            return SubmitOutcome::Closed;
        }

        if self.is_elapsed(now) {
            return SubmitOutcome::WindowElapsed;
        }

        self.registry.submit(tag, sample);
        self.frame.record(sample);

        SubmitOutcome::Recorded
    }

    /// Stops accepting samples.
    ///
    /// Returns `true` only for the call that actually closed the session, so that the
    /// session is finalized exactly once.
    pub(crate) fn close(&self) -> bool {
        let mut open = self.gate.write();
        let was_open = *open;
        *open = false;
        was_open
    }

    /// Produces the report of a closed session.
    pub(crate) fn to_report(&self) -> Report {
        debug_assert!(
            !*self.gate.read(),
            "report requested from a session still accepting samples"
        );

        Report::new(self.window, self.registry.snapshot(), self.frame.snapshot())
    }
}
