use crate::{BoxedSink, Clock, Engine, LogSink, OverlapPolicy, ReportSink};

/// Creates instances of [`Engine`].
///
/// All parameters are optional:
/// * `clock` - defaults to the operating system monotonic clock.
/// * `overlap_policy` - defaults to [`OverlapPolicy::Reject`].
/// * `sink` - defaults to [`LogSink`].
///
/// Use `Engine::builder()` to create a new instance of this builder.
#[derive(Debug)]
pub struct EngineBuilder {
    clock: Clock,
    overlap_policy: OverlapPolicy,
    sink: BoxedSink,
}

impl EngineBuilder {
    pub(crate) fn new() -> Self {
        Self {
            clock: Clock::real(),
            overlap_policy: OverlapPolicy::default(),
            sink: BoxedSink(Box::new(LogSink)),
        }
    }

    /// Sets the time source used to measure timers and capture windows.
    ///
    /// # Example
    ///
    /// ```
    /// use scope_watch::{Engine, ManualClock};
    ///
    /// let clock = ManualClock::new();
    /// let engine = Engine::builder().clock(clock.clone()).build();
    /// ```
    #[must_use]
    pub fn clock(self, clock: impl Into<Clock>) -> Self {
        Self {
            clock: clock.into(),
            ..self
        }
    }

    /// Sets what happens when a capture is requested while another one is running.
    #[must_use]
    pub fn overlap_policy(self, overlap_policy: OverlapPolicy) -> Self {
        Self {
            overlap_policy,
            ..self
        }
    }

    /// Sets the destination of finished capture reports.
    ///
    /// # Example
    ///
    /// ```
    /// use scope_watch::{Engine, Report};
    ///
    /// let engine = Engine::builder()
    ///     .sink(|report: &Report| eprintln!("{report}"))
    ///     .build();
    /// ```
    #[must_use]
    pub fn sink(self, sink: impl ReportSink) -> Self {
        Self {
            sink: BoxedSink(Box::new(sink)),
            ..self
        }
    }

    /// Creates the engine. It starts out idle.
    #[must_use]
    pub fn build(self) -> Engine {
        Engine::from_builder(self.clock, self.overlap_policy, self.sink)
    }
}
