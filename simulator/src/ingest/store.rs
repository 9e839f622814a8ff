use serde::{Deserialize, Serialize};
use shotcore::model::{EstimatedLocation, GunshotEvent, LogEntry, Sensor};

use crate::ingest::locate::meters_between;

/// A mic moving less than this keeps its recorded position.
const MIC_MOVE_THRESHOLD_M: f64 = 10.0;

/// Reported timestamps more than a year ahead of the wall clock are junk.
const MAX_FUTURE_SECS: f64 = 365.0 * 24.0 * 3600.0;

/// One mic's report of a detection: position plus arrival timestamp in
/// microseconds since the epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MicReport {
    pub mic_id: u32,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: i64,
}

impl MicReport {
    pub fn new(mic_id: u32, lat: f64, lon: f64, timestamp: i64) -> Self {
        Self {
            mic_id,
            lat,
            lon,
            timestamp,
        }
    }
}

/// A detection event retained by the store, with its contributing mics.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEvent {
    pub lat: f64,
    pub lon: f64,
    pub time: i64,
    pub mic_ids: Vec<u32>,
}

impl StoredEvent {
    pub fn to_gunshot_event(&self) -> GunshotEvent {
        GunshotEvent {
            estimated_location: EstimatedLocation {
                lat: self.lat,
                lon: self.lon,
                time: self.time,
            },
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum IngestOutcome {
    Recorded { sensor_moved: bool },
    Duplicate,
    Invalid(String),
}

/// In-memory stand-in for the backend's database: mic positions, raw log
/// events, and detected gunshot events.
#[derive(Debug, Default)]
pub struct SimStore {
    sensors: Vec<Sensor>,
    logs: Vec<MicReport>,
    events: Vec<StoredEvent>,
}

impl SimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensors(sensors: Vec<Sensor>) -> Self {
        Self {
            sensors,
            ..Default::default()
        }
    }

    /// Validate and record one mic report. Duplicate `(mic_id, timestamp)`
    /// pairs are dropped; the reporting mic's position is refreshed when it
    /// moved beyond the threshold (new mics are inserted outright).
    pub fn ingest(&mut self, report: MicReport, now_secs: f64) -> IngestOutcome {
        if !(-90.0..=90.0).contains(&report.lat) {
            return IngestOutcome::Invalid(format!("invalid latitude: {}", report.lat));
        }
        if !(-180.0..=180.0).contains(&report.lon) {
            return IngestOutcome::Invalid(format!("invalid longitude: {}", report.lon));
        }
        let timestamp_secs = report.timestamp as f64 / 1e6;
        if timestamp_secs <= 0.0 || timestamp_secs > now_secs + MAX_FUTURE_SECS {
            return IngestOutcome::Invalid(format!("invalid timestamp: {}", report.timestamp));
        }
        if self
            .logs
            .iter()
            .any(|log| log.mic_id == report.mic_id && log.timestamp == report.timestamp)
        {
            return IngestOutcome::Duplicate;
        }

        self.logs.push(report);
        let sensor_moved = self.refresh_sensor_position(&report);
        IngestOutcome::Recorded { sensor_moved }
    }

    fn refresh_sensor_position(&mut self, report: &MicReport) -> bool {
        match self
            .sensors
            .iter_mut()
            .find(|sensor| sensor.mic_id == report.mic_id)
        {
            Some(sensor) => {
                let moved = meters_between(sensor.lat, sensor.lon, report.lat, report.lon);
                if moved > MIC_MOVE_THRESHOLD_M {
                    sensor.lat = report.lat;
                    sensor.lon = report.lon;
                    return true;
                }
                false
            }
            None => {
                self.sensors
                    .push(Sensor::new(report.mic_id, report.lat, report.lon));
                true
            }
        }
    }

    /// Raw reports whose arrival time lies in `[start, end]` microseconds,
    /// sorted by timestamp.
    pub fn logs_between(&self, start_micros: i64, end_micros: i64) -> Vec<MicReport> {
        let mut slice: Vec<MicReport> = self
            .logs
            .iter()
            .filter(|log| log.timestamp >= start_micros && log.timestamp <= end_micros)
            .copied()
            .collect();
        slice.sort_by_key(|log| log.timestamp);
        slice
    }

    /// Record detections, skipping any within half a second of an already
    /// stored event (overlapping debounce scans must not duplicate).
    pub fn record_events(&mut self, detected: Vec<StoredEvent>) -> Vec<StoredEvent> {
        let mut fresh = Vec::new();
        for event in detected {
            let seen = self
                .events
                .iter()
                .any(|stored| (stored.time - event.time).abs() < 500_000);
            if !seen {
                self.events.push(event.clone());
                fresh.push(event);
            }
        }
        fresh
    }

    pub fn sensors(&self) -> Vec<Sensor> {
        self.sensors.clone()
    }

    /// Log entries as served to clients: second granularity, mic id only.
    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.logs
            .iter()
            .map(|log| LogEntry::new(log.timestamp / 1_000_000, log.mic_id))
            .collect()
    }

    /// Stored events, most recent first.
    pub fn events_desc(&self) -> Vec<StoredEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|event| std::cmp::Reverse(event.time));
        events
    }

    pub fn clear_all(&mut self) {
        self.sensors.clear();
        self.logs.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW_SECS: f64 = 1_700_000_000.0;

    fn report(mic_id: u32, timestamp: i64) -> MicReport {
        MicReport::new(mic_id, 42.28, -83.74, timestamp)
    }

    #[test]
    fn ingest_rejects_out_of_range_coordinates() {
        let mut store = SimStore::new();
        let bad_lat = MicReport::new(1, 95.0, 0.0, 1_700_000_000_000_000);
        let bad_lon = MicReport::new(1, 0.0, -200.0, 1_700_000_000_000_000);

        assert!(matches!(
            store.ingest(bad_lat, NOW_SECS),
            IngestOutcome::Invalid(_)
        ));
        assert!(matches!(
            store.ingest(bad_lon, NOW_SECS),
            IngestOutcome::Invalid(_)
        ));
    }

    #[test]
    fn ingest_rejects_far_future_timestamps() {
        let mut store = SimStore::new();
        let two_years_ahead = ((NOW_SECS + 2.0 * 365.0 * 24.0 * 3600.0) * 1e6) as i64;
        assert!(matches!(
            store.ingest(report(1, two_years_ahead), NOW_SECS),
            IngestOutcome::Invalid(_)
        ));
    }

    #[test]
    fn duplicate_reports_are_dropped() {
        let mut store = SimStore::new();
        let first = store.ingest(report(1, 1_700_000_000_000_000), NOW_SECS);
        assert!(matches!(first, IngestOutcome::Recorded { .. }));
        assert_eq!(
            store.ingest(report(1, 1_700_000_000_000_000), NOW_SECS),
            IngestOutcome::Duplicate
        );
        assert_eq!(store.log_entries().len(), 1);
    }

    #[test]
    fn new_mic_is_inserted_and_small_moves_are_ignored() {
        let mut store = SimStore::new();
        let outcome = store.ingest(report(7, 1_700_000_000_000_000), NOW_SECS);
        assert_eq!(outcome, IngestOutcome::Recorded { sensor_moved: true });

        // A couple of meters of jitter does not move the recorded position.
        let nearby = MicReport::new(7, 42.280_01, -83.74, 1_700_000_001_000_000);
        let outcome = store.ingest(nearby, NOW_SECS);
        assert_eq!(outcome, IngestOutcome::Recorded { sensor_moved: false });

        // A genuine relocation does.
        let far = MicReport::new(7, 42.281, -83.74, 1_700_000_002_000_000);
        let outcome = store.ingest(far, NOW_SECS);
        assert_eq!(outcome, IngestOutcome::Recorded { sensor_moved: true });
        assert!((store.sensors()[0].lat - 42.281).abs() < 1e-9);
    }

    #[test]
    fn log_entries_are_served_at_second_granularity() {
        let mut store = SimStore::new();
        store.ingest(report(1, 1_700_000_000_250_000), NOW_SECS);
        let entries = store.log_entries();
        assert_eq!(entries[0].timestamp, 1_700_000_000);
    }

    #[test]
    fn record_events_skips_near_duplicates() {
        let mut store = SimStore::new();
        let event = StoredEvent {
            lat: 42.28,
            lon: -83.74,
            time: 1_700_000_000_000_000,
            mic_ids: vec![1, 2, 3],
        };
        let mut rerun = event.clone();
        rerun.time += 100_000;

        assert_eq!(store.record_events(vec![event]).len(), 1);
        assert!(store.record_events(vec![rerun]).is_empty());
        assert_eq!(store.events_desc().len(), 1);
    }
}
