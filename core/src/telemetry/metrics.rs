use std::sync::Mutex;

/// Counters for the engine's asynchronous boundaries.
#[derive(Debug, Default)]
pub struct FeedMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub applied: usize,
    pub malformed: usize,
    pub reconnects: usize,
    pub fetch_failures: usize,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_applied(&self) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.applied += 1;
        }
    }

    pub fn record_malformed(&self) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.malformed += 1;
        }
    }

    pub fn record_reconnect(&self) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.reconnects += 1;
        }
    }

    pub fn record_fetch_failure(&self) {
        if let Ok(mut snapshot) = self.inner.lock() {
            snapshot.fetch_failures += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|snapshot| *snapshot)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = FeedMetrics::new();
        metrics.record_applied();
        metrics.record_applied();
        metrics.record_malformed();
        metrics.record_reconnect();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.applied, 2);
        assert_eq!(snapshot.malformed, 1);
        assert_eq!(snapshot.reconnects, 1);
        assert_eq!(snapshot.fetch_failures, 0);
    }
}
