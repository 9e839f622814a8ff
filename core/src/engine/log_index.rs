use crate::engine::LOG_MATCH_TOLERANCE_SECS;
use crate::model::LogEntry;

/// Wholesale snapshot of the external log store plus the derived lookups:
/// the distinct timestamps offered in the dropdown and the
/// timestamp-to-triggering-mic correlation.
#[derive(Debug, Default)]
pub struct LogIndex {
    all_logs: Vec<LogEntry>,
    timestamps: Vec<i64>,
}

impl LogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot and rebuild the distinct timestamp list,
    /// sorted descending (most recent first).
    pub fn replace(&mut self, logs: Vec<LogEntry>) {
        let mut timestamps: Vec<i64> = logs.iter().map(|entry| entry.timestamp).collect();
        timestamps.sort_unstable_by(|a, b| b.cmp(a));
        timestamps.dedup();
        self.timestamps = timestamps;
        self.all_logs = logs;
    }

    /// Fail-safe empty state used when a fetch fails.
    pub fn clear(&mut self) {
        self.all_logs.clear();
        self.timestamps.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.all_logs.is_empty()
    }

    /// Distinct timestamps, descending.
    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    /// Distinct mic ids whose log entry lies within the +/-1 s tolerance of
    /// `ts_secs`. Arrival times across the array are not perfectly
    /// synchronized, hence the tolerance.
    pub fn sensors_triggered_at(&self, ts_secs: f64) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .all_logs
            .iter()
            .filter(|entry| (entry.timestamp as f64 - ts_secs).abs() <= LOG_MATCH_TOLERANCE_SECS)
            .map(|entry| entry.mic_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
