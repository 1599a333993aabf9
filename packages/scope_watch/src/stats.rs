use std::sync::atomic::{self, AtomicU64};
use std::time::Duration;

/// Aggregate timing statistics for one tag (or for all samples of a capture, in the Total row).
///
/// When `count() > 0` the values satisfy `min() <= mean() <= max()`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TagStats {
    min: Duration,
    max: Duration,
    cumulative: Duration,
    count: u64,
}

impl TagStats {
    /// Shortest recorded sample. Zero if nothing was recorded.
    #[must_use]
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Longest recorded sample. Zero if nothing was recorded.
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Sum of all recorded samples.
    #[must_use]
    pub fn cumulative(&self) -> Duration {
        self.cumulative
    }

    /// Number of recorded samples.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean sample duration, computed from the cumulative time and the sample count.
    ///
    /// Returns zero duration if no samples have been recorded.
    #[must_use]
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(
                self.cumulative
                    .as_nanos()
                    .checked_div(u128::from(self.count))
                    .expect("guarded by if condition")
                    .try_into()
                    .expect("mean cannot exceed the cumulative time, which fits in u64"),
            )
        }
    }

    /// Whether any samples were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// We use `Relaxed` ordering for all atomic operations because the hot path must stay cheap.
/// Reads only happen during finalization, after the session gate has been taken exclusively,
/// and the gate lock provides the necessary happens-before relationship with every writer.
const CELL_ACCESS_ORDERING: atomic::Ordering = atomic::Ordering::Relaxed;

/// Lock-free accumulator behind a [`TagStats`].
///
/// Each field is updated with a single atomic read-modify-write, so concurrent
/// samples for the same tag are never lost.
#[derive(Debug)]
pub(crate) struct StatsCell {
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
    cumulative_nanos: AtomicU64,
    count: AtomicU64,
}

impl StatsCell {
    pub(crate) fn new() -> Self {
        Self {
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
            cumulative_nanos: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Adds one sample to the aggregate.
    pub(crate) fn record(&self, sample: Duration) {
        // u64 nanoseconds cover ~584 years per sample, anything longer is clamped.
        let nanos = u64::try_from(sample.as_nanos()).unwrap_or(u64::MAX);

        self.min_nanos.fetch_min(nanos, CELL_ACCESS_ORDERING);
        self.max_nanos.fetch_max(nanos, CELL_ACCESS_ORDERING);
        // Saturating, so a cumulative value never drops below the max.
        _ = self.cumulative_nanos.fetch_update(
            CELL_ACCESS_ORDERING,
            CELL_ACCESS_ORDERING,
            |cumulative| Some(cumulative.saturating_add(nanos)),
        );
        self.count.fetch_add(1, CELL_ACCESS_ORDERING);
    }

    pub(crate) fn snapshot(&self) -> TagStats {
        let count = self.count.load(CELL_ACCESS_ORDERING);

        if count == 0 {
            return TagStats::default();
        }

        TagStats {
            min: Duration::from_nanos(self.min_nanos.load(CELL_ACCESS_ORDERING)),
            max: Duration::from_nanos(self.max_nanos.load(CELL_ACCESS_ORDERING)),
            cumulative: Duration::from_nanos(self.cumulative_nanos.load(CELL_ACCESS_ORDERING)),
            count,
        }
    }
}

impl Default for StatsCell {
    fn default() -> Self {
        Self::new()
    }
}
