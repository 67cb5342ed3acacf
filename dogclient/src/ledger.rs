use std::collections::HashMap;

/// In-memory accumulation table used in mock mode.
///
/// Keyed by metric name, then by tag; a cell holds the sum of every amount
/// recorded for that metric while that tag was in the effective tag set.
/// Absent cells read as zero and are synthesized on read, never stored.
///
/// Metrics are recorded under their BARE name: the prefix is applied only on
/// the wire path. Tests assert on unprefixed names, and that behavior is
/// kept deliberately.
#[derive(Debug, Default)]
pub(crate) struct MockLedger {
    table: HashMap<String, HashMap<String, f64>>,
}

impl MockLedger {
    /// Adds `amount` to every `(metric, tag)` cell named by `tags`.
    ///
    /// `tags` is the effective tag set; the base-tag union already happened
    /// at the call site.
    pub(crate) fn record(&mut self, metric: &str, amount: f64, tags: &[String]) {
        let row = self.table.entry(metric.to_owned()).or_default();
        for tag in tags {
            *row.entry(tag.clone()).or_insert(0.0) += amount;
        }
    }

    /// Accumulated value for `(metric, tag)`, or `0.0` if either is unseen.
    pub(crate) fn get(&self, metric: &str, tag: &str) -> f64 {
        self.table.get(metric).and_then(|row| row.get(tag)).copied().unwrap_or(0.0)
    }

    /// Discards all accumulated state.
    pub(crate) fn clear(&mut self) {
        self.table.clear();
    }
}
