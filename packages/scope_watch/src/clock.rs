//! Monotonic time source for timers and capture windows.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Provides the timestamps used both to measure timers and to detect the end of a capture window.
///
/// By default this is the operating system monotonic clock (via [`std::time::Instant`]). Hosts
/// that drive their own notion of time (and tests) can supply a [`ManualClock`] instead.
///
/// Clones share the same time source.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use scope_watch::{Clock, ManualClock};
///
/// let manual = ManualClock::new();
/// let clock = Clock::from(manual.clone());
///
/// let start = clock.now();
/// manual.advance(Duration::from_millis(5));
///
/// assert_eq!(Clock::elapsed(start, clock.now()), Duration::from_millis(5));
/// ```
#[derive(Clone, Debug)]
pub struct Clock {
    source: TimeSource,
}

#[derive(Clone, Debug)]
enum TimeSource {
    Real,
    Manual(ManualClock),
}

impl Clock {
    /// Creates a clock backed by the operating system monotonic clock.
    #[must_use]
    pub fn real() -> Self {
        Self {
            source: TimeSource::Real,
        }
    }

    /// The current timestamp. Never decreases between calls on the same clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        match &self.source {
            TimeSource::Real => Instant::now(),
            TimeSource::Manual(manual) => manual.now(),
        }
    }

    /// Time elapsed between two timestamps of the same clock.
    ///
    /// Saturates to zero if `end` is earlier than `start`.
    #[must_use]
    pub fn elapsed(start: Instant, end: Instant) -> Duration {
        end.saturating_duration_since(start)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}

impl From<ManualClock> for Clock {
    fn from(manual: ManualClock) -> Self {
        Self {
            source: TimeSource::Manual(manual),
        }
    }
}

/// A clock whose time only moves when told to.
///
/// Multiple clones of the same `ManualClock` share the same underlying time, so a host
/// (or a test) can keep one clone and hand another to the engine via [`Clock::from`].
#[derive(Clone, Debug)]
pub struct ManualClock {
    state: Arc<ManualClockState>,
}

#[derive(Debug)]
struct ManualClockState {
    origin: Instant,

    // Total amount the clock has been advanced since creation.
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a manual clock positioned at the current real time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(ManualClockState {
                origin: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }),
        }
    }

    /// Moves the clock forward by `by`.
    ///
    /// This affects all clones of this clock.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.state.offset.lock();
        *offset = offset
            .checked_add(by)
            .expect("manual clock offset overflows Duration - this indicates an unrealistic scenario");
    }

    /// The current timestamp of the manual clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        let offset = *self.state.offset.lock();

        self.state
            .origin
            .checked_add(offset)
            .expect("manual clock advanced beyond the representable range of Instant")
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Clock: Send, Sync);
    static_assertions::assert_impl_all!(ManualClock: Send, Sync);

    #[test]
    fn manual_clock_starts_still() {
        let manual = ManualClock::new();

        let first = manual.now();
        let second = manual.now();

        assert_eq!(first, second);
    }

    #[test]
    fn manual_clock_advance_is_shared_between_clones() {
        let manual = ManualClock::new();
        let clock = Clock::from(manual.clone());

        let start = clock.now();
        manual.advance(Duration::from_millis(50));
        manual.advance(Duration::from_millis(30));

        assert_eq!(Clock::elapsed(start, clock.now()), Duration::from_millis(80));
    }

    #[test]
    fn elapsed_saturates_when_end_precedes_start() {
        let manual = ManualClock::new();
        let earlier = manual.now();
        manual.advance(Duration::from_secs(1));
        let later = manual.now();

        assert_eq!(Clock::elapsed(later, earlier), Duration::ZERO);
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri time is not meaningful for this check.
    fn real_clock_never_decreases() {
        let clock = Clock::real();

        let mut previous = clock.now();
        for _ in 0..1000 {
            let current = clock.now();
            assert!(current >= previous);
            previous = current;
        }
    }
}
