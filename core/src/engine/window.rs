use crate::engine::LIVE_WINDOW_MICROS;
use crate::model::GunshotEvent;

/// Rolling set of currently relevant gunshot events.
///
/// Eviction runs on both sides of every append: stale held events go
/// first, then the (already window-filtered) batch is concatenated, so the
/// stored set never exceeds the relevance window regardless of append
/// cadence or gaps in connectivity. The set is empty on startup and is not
/// persisted.
#[derive(Debug, Default)]
pub struct EventWindow {
    events: Vec<GunshotEvent>,
}

impl EventWindow {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Evict everything older than the live window, then admit the batch.
    /// Incoming events are not deduplicated against held ones.
    pub fn append(&mut self, now_micros: i64, batch: Vec<GunshotEvent>) {
        self.events
            .retain(|event| now_micros - event.time_micros() <= LIVE_WINDOW_MICROS);
        self.events.extend(batch);
    }

    /// Events still inside the live window at `now_micros`. Re-evaluated on
    /// every read since "now" advances even without new appends.
    pub fn currently_live(&self, now_micros: i64) -> Vec<GunshotEvent> {
        self.events
            .iter()
            .filter(|event| now_micros - event.time_micros() <= LIVE_WINDOW_MICROS)
            .cloned()
            .collect()
    }

    /// All held events, regardless of the clock. History-mode correlation
    /// runs over this same in-memory set.
    pub fn iter(&self) -> impl Iterator<Item = &GunshotEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_at(time: i64) -> GunshotEvent {
        GunshotEvent::new(42.0, -83.0, time)
    }

    #[test]
    fn append_evicts_stale_events() {
        let now = 20_000_000;
        let mut window = EventWindow::new();
        window.append(now - 11_000_000, vec![event_at(now - 12_000_000)]);
        window.append(now, vec![event_at(now - 1_000_000)]);

        assert_eq!(window.len(), 1);
        assert!(window
            .iter()
            .all(|event| now - event.time_micros() <= LIVE_WINDOW_MICROS));
    }

    #[test]
    fn empty_append_only_evicts() {
        let now = 50_000_000;
        let mut window = EventWindow::new();
        window.append(now, vec![event_at(now - 5_000_000), event_at(now - 9_999_999)]);
        assert_eq!(window.len(), 2);

        window.append(now, Vec::new());
        assert_eq!(window.len(), 2);

        window.append(now + 10_000_000, Vec::new());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn live_read_applies_window_boundaries() {
        let now = 100_000_000;
        let mut window = EventWindow::new();
        window.append(
            now,
            vec![event_at(now - 9_999_999), event_at(now - 10_000_000)],
        );

        // An event exactly one microsecond past the window disappears from
        // the live read even though nothing was appended since.
        let live = window.currently_live(now + 1);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].time_micros(), now - 9_999_999);
    }

    #[test]
    fn duplicates_coexist_inside_the_window() {
        let now = 30_000_000;
        let mut window = EventWindow::new();
        window.append(now, vec![event_at(now - 100), event_at(now - 100)]);
        assert_eq!(window.currently_live(now).len(), 2);
    }
}
