use std::cmp::Reverse;
use std::time::Duration;

use foldhash::{HashMap, HashMapExt};
use parking_lot::RwLock;

use crate::{StatsCell, Tag, TagStats};

/// Per-tag statistics of one capture session.
///
/// Lookups of existing tags only take the shared lock, so samples for known tags from
/// different threads proceed in parallel. The exclusive lock is only taken the first
/// time a tag is seen, which guarantees exactly one [`StatsCell`] per tag.
#[derive(Debug)]
pub(crate) struct Registry {
    entries: RwLock<HashMap<Tag, StatsCell>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Adds one sample to the statistics of `tag`, creating the entry on first use.
    pub(crate) fn submit(&self, tag: Tag, sample: Duration) {
        {
            let entries = self.entries.read();

            if let Some(cell) = entries.get(&tag) {
                cell.record(sample);
                return;
            }
        }

        // Another thread may have created the entry between us releasing the shared lock
        // and taking the exclusive one - the entry API resolves that race.
        self.entries.write().entry(tag).or_default().record(sample);
    }

    /// A frozen view of all entries, sorted by cumulative time (descending), then by tag.
    ///
    /// The caller is responsible for ensuring no submissions race with the snapshot if
    /// it needs a consistent view across tags.
    pub(crate) fn snapshot(&self) -> Vec<(Tag, TagStats)> {
        let mut rows = self
            .entries
            .read()
            .iter()
            .map(|(tag, cell)| (tag.clone(), cell.snapshot()))
            .collect::<Vec<_>>();

        rows.sort_by(|(a_tag, a_stats), (b_tag, b_stats)| {
            Reverse(a_stats.cumulative())
                .cmp(&Reverse(b_stats.cumulative()))
                .then_with(|| a_tag.cmp(b_tag))
        });

        rows
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
