use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::engine::{EventWindow, LogIndex, HISTORY_WINDOW_MICROS, LIVE_WINDOW_MICROS};
use crate::model::{GunshotEvent, Sensor};

/// Propagation speed used for the constant confidence radius, in m/s.
const SPEED_OF_SOUND_MPS: f64 = 343.0;

/// Assumed arrival-time error across the array, in seconds.
const ARRIVAL_TIME_ERROR_SECS: f64 = 0.100;

/// User display selection: live wall-clock streaming, or one historical
/// instant chosen from the log timestamps. Set only by explicit user
/// action; never auto-cleared.
///
/// The selection carries the instant once and exposes it in both time
/// bases: seconds for log matching, microseconds for event matching. The
/// two never unify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Live,
    At {
        micros: i64,
    },
}

impl Selection {
    /// Select the historical instant at `ts_secs`. Log timestamps are
    /// second-granularity but fractional values are accepted.
    pub fn at_seconds(ts_secs: f64) -> Self {
        Self::At {
            micros: (ts_secs * 1_000_000.0).round() as i64,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Selection::Live)
    }

    /// Selected instant in seconds, for the +/-1 s log correlation.
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Selection::Live => None,
            Selection::At { micros } => Some(*micros as f64 / 1_000_000.0),
        }
    }

    /// Selected instant in microseconds, for the <50 ms event correlation.
    pub fn micros(&self) -> Option<i64> {
        match self {
            Selection::Live => None,
            Selection::At { micros } => Some(*micros),
        }
    }
}

/// One gunshot event prepared for the render surface.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DisplayEvent {
    pub lat: f64,
    pub lon: f64,
    pub time_micros: i64,
    pub confidence_radius_m: f64,
    pub time_label: String,
}

/// Constant per-event confidence radius in meters. Derived from
/// propagation speed and arrival-time error, not from sensor geometry.
pub fn confidence_radius_m() -> f64 {
    SPEED_OF_SOUND_MPS * ARRIVAL_TIME_ERROR_SECS
}

/// Local wall-clock label for an event time in microseconds.
pub fn event_time_label(time_micros: i64) -> String {
    let millis = time_micros / 1_000;
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Local wall-clock label for a second-granularity log timestamp.
pub fn timestamp_label(ts_secs: i64) -> String {
    Local
        .timestamp_opt(ts_secs, 0)
        .single()
        .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts_secs.to_string())
}

/// Whether `event` should be displayed under `selection` at `now_micros`.
/// Live mode uses the rolling 10 s window; history mode uses the tight
/// window around the selected instant.
pub fn event_visible(selection: Selection, now_micros: i64, event: &GunshotEvent) -> bool {
    match selection {
        Selection::Live => now_micros - event.time_micros() <= LIVE_WINDOW_MICROS,
        Selection::At { micros } => (event.time_micros() - micros).abs() < HISTORY_WINDOW_MICROS,
    }
}

/// Events to display. Both modes draw from the same in-memory window
/// store; history mode does not re-fetch gunshot estimates.
pub fn visible_events(
    selection: Selection,
    now_micros: i64,
    window: &EventWindow,
) -> Vec<DisplayEvent> {
    window
        .iter()
        .filter(|event| event_visible(selection, now_micros, event))
        .map(display_event)
        .collect()
}

pub fn display_event(event: &GunshotEvent) -> DisplayEvent {
    DisplayEvent {
        lat: event.estimated_location.lat,
        lon: event.estimated_location.lon,
        time_micros: event.time_micros(),
        confidence_radius_m: confidence_radius_m(),
        time_label: event_time_label(event.time_micros()),
    }
}

/// Mic ids highlighted as triggering under `selection`. Always derived
/// from the log index; empty in live mode.
pub fn triggered_mic_ids(selection: Selection, logs: &LogIndex) -> Vec<u32> {
    match selection.seconds() {
        Some(ts_secs) => logs.sensors_triggered_at(ts_secs),
        None => Vec::new(),
    }
}

/// Sensors to show. An empty triggered set means "no filter", not "no
/// sensors".
pub fn visible_sensors(sensors: &[Sensor], triggered: &[u32]) -> Vec<Sensor> {
    if triggered.is_empty() {
        return sensors.to_vec();
    }
    sensors
        .iter()
        .filter(|sensor| triggered.contains(&sensor.mic_id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogEntry;

    #[test]
    fn live_and_history_use_different_windows() {
        let now = 100_000_000;
        let event = GunshotEvent::new(42.0, -83.0, now - 1_000_000);

        assert!(event_visible(Selection::Live, now, &event));
        // One second away from the selected instant is far outside the
        // 50 ms history window.
        let selected = Selection::At {
            micros: event.time_micros() + 1_000_000,
        };
        assert!(!event_visible(selected, now, &event));

        let near = Selection::At {
            micros: event.time_micros() + 49_999,
        };
        assert!(event_visible(near, now, &event));
        let edge = Selection::At {
            micros: event.time_micros() + 50_000,
        };
        assert!(!event_visible(edge, now, &event));
    }

    #[test]
    fn live_window_boundary_is_inclusive() {
        let now = 100_000_000;
        let inside = GunshotEvent::new(0.0, 0.0, now - 9_999_999);
        let exact = GunshotEvent::new(0.0, 0.0, now - 10_000_000);
        let outside = GunshotEvent::new(0.0, 0.0, now - 10_000_001);

        assert!(event_visible(Selection::Live, now, &inside));
        assert!(event_visible(Selection::Live, now, &exact));
        assert!(!event_visible(Selection::Live, now, &outside));
    }

    #[test]
    fn history_mode_ignores_the_clock() {
        let event = GunshotEvent::new(0.0, 0.0, 500_000_000);
        let selection = Selection::at_seconds(500.0);

        // Far-future "now" does not hide a history-selected event.
        assert!(event_visible(selection, i64::MAX / 2, &event));
    }

    #[test]
    fn confidence_radius_is_constant() {
        assert!((confidence_radius_m() - 34.3).abs() < 1e-9);
    }

    #[test]
    fn triggered_ids_empty_in_live_mode() {
        let mut logs = LogIndex::new();
        logs.replace(vec![LogEntry::new(100, 1)]);

        assert!(triggered_mic_ids(Selection::Live, &logs).is_empty());
        assert_eq!(
            triggered_mic_ids(Selection::at_seconds(100.0), &logs),
            vec![1]
        );
    }

    #[test]
    fn empty_triggered_set_shows_all_sensors() {
        let sensors = vec![Sensor::new(1, 10.0, 20.0), Sensor::new(2, 30.0, 40.0)];

        assert_eq!(visible_sensors(&sensors, &[]).len(), 2);
        let filtered = visible_sensors(&sensors, &[2]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].mic_id, 2);
    }

    #[test]
    fn selection_exposes_both_time_bases() {
        let selection = Selection::at_seconds(100.5);
        assert_eq!(selection.micros(), Some(100_500_000));
        assert_eq!(selection.seconds(), Some(100.5));
        assert_eq!(Selection::Live.micros(), None);
    }
}
