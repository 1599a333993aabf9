//! Capture reports.

use std::fmt::{self, Display, Write};
use std::time::Duration;

use crate::{HumanDuration, Tag, TagStats};

/// Tag names longer than this are truncated in the rendered table.
const NAME_WIDTH: usize = 40;

/// Width of each duration column.
const DURATION_WIDTH: usize = 10;

/// Width of the call count column.
const CALLS_WIDTH: usize = 8;

/// Appended to truncated tag names.
const TRUNCATION_MARKER: &str = "...";

/// The result of one finished capture window.
///
/// For human-readable output, use the `Display` trait implementation. This renders a
/// fixed-width, pipe-delimited table using only the basic ASCII character set:
///
/// ```text
/// Name                                     |        Min |        Max |        Avg |      Cumul |    Calls
/// -------------------------------------------------------------------------------------------------------
/// A::B                                     |    30.00ms |    50.00ms |    40.00ms |    80.00ms |        2
/// -------------------------------------------------------------------------------------------------------
/// Total                                    |    30.00ms |    50.00ms |    40.00ms |    80.00ms |        2
/// ```
///
/// For machine-readable output, inspect report contents via the provided methods.
#[derive(Clone, Debug)]
pub struct Report {
    window: Duration,

    // Sorted by cumulative time descending, then by tag ascending.
    rows: Box<[ReportRow]>,

    total: TagStats,
}

/// Statistics of a single tag in a [`Report`].
#[derive(Clone, Debug)]
pub struct ReportRow {
    tag: Tag,
    stats: TagStats,
}

impl Report {
    pub(crate) fn new(window: Duration, rows: Vec<(Tag, TagStats)>, total: TagStats) -> Self {
        Self {
            window,
            rows: rows
                .into_iter()
                .map(|(tag, stats)| ReportRow { tag, stats })
                .collect(),
            total,
        }
    }

    /// The configured length of the capture window that produced this report.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Iterates over the per-tag rows, ordered by cumulative time (largest first).
    /// Rows with equal cumulative time are ordered by tag.
    pub fn rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter()
    }

    /// Looks up the row of a specific tag.
    #[must_use]
    pub fn row(&self, tag: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.tag.as_str() == tag)
    }

    /// Aggregate over every sample of the capture, regardless of tag.
    #[must_use]
    pub fn total(&self) -> TagStats {
        self.total
    }

    /// Whether no samples were recorded during the capture.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }
}

impl ReportRow {
    /// The tag these statistics belong to.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// The statistics of the tag.
    #[must_use]
    pub fn stats(&self) -> TagStats {
        self.stats
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = String::new();
        write!(
            header,
            "{:<NAME_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>CALLS_WIDTH$}",
            "Name", "Min", "Max", "Avg", "Cumul", "Calls"
        )?;

        let rule = "-".repeat(header.len());

        writeln!(f, "{header}")?;
        writeln!(f, "{rule}")?;

        for row in &self.rows {
            write_row(f, row.tag.as_str(), &row.stats)?;
        }

        writeln!(f, "{rule}")?;
        write_row(f, "Total", &self.total)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, stats: &TagStats) -> fmt::Result {
    let name = truncate_name(name);

    writeln!(
        f,
        "{name:<NAME_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>DURATION_WIDTH$} | {:>CALLS_WIDTH$}",
        HumanDuration::from(stats.min()),
        HumanDuration::from(stats.max()),
        HumanDuration::from(stats.mean()),
        HumanDuration::from(stats.cumulative()),
        stats.count()
    )
}

/// Shortens `name` to at most `NAME_WIDTH` characters, marking the cut.
fn truncate_name(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_string();
    }

    let keep = NAME_WIDTH.saturating_sub(TRUNCATION_MARKER.len());

    let mut truncated = name.chars().take(keep).collect::<String>();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
