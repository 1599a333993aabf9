use std::fmt::{self, Debug};

use tracing::info;

use crate::Report;

/// Receives the report of every capture window that runs to completion.
///
/// The engine calls the sink from whichever thread detects that the window has elapsed,
/// after the capture has already returned to idle. A sink may therefore start the next
/// capture from within `deliver()`.
///
/// Any `Fn(&Report) + Send + Sync` closure is a sink.
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink: Send + Sync + 'static {
    /// Handles the report of a finished capture.
    fn deliver(&self, report: &Report);
}

impl<F> ReportSink for F
where
    F: Fn(&Report) + Send + Sync + 'static,
{
    fn deliver(&self, report: &Report) {
        self(report);
    }
}

/// Writes the rendered report table to the `tracing` log at info level.
///
/// This is the sink used when none is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    #[cfg_attr(test, mutants::skip)] // Log output is not observable from tests.
    fn deliver(&self, report: &Report) {
        info!(
            window = ?report.window(),
            samples = report.total().count(),
            tags = report.rows().count(),
            "capture finished\n{report}"
        );
    }
}

/// Type-erased sink stored by the engine.
pub(crate) struct BoxedSink(pub(crate) Box<dyn ReportSink>);

impl Debug for BoxedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::TagStats;

    static_assertions::assert_impl_all!(LogSink: ReportSink, Send, Sync);

    fn empty_report() -> Report {
        Report::new(Duration::from_secs(1), Vec::new(), TagStats::default())
    }

    #[test]
    fn closure_is_a_sink() {
        let delivered = Arc::new(AtomicU64::new(0));

        let sink = {
            let delivered = Arc::clone(&delivered);
            move |_: &Report| {
                delivered.fetch_add(1, Ordering::Relaxed);
            }
        };

        sink.deliver(&empty_report());
        sink.deliver(&empty_report());

        assert_eq!(delivered.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn boxed_sink_forwards() {
        let mut mock = MockReportSink::new();
        mock.expect_deliver()
            .withf(|report| report.window() == Duration::from_secs(1))
            .times(1)
            .return_const(());

        let boxed = BoxedSink(Box::new(mock));
        boxed.0.deliver(&empty_report());
    }

    #[test]
    fn log_sink_accepts_report() {
        LogSink.deliver(&empty_report());
    }
}
