use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::ingest::locate::estimate_location;
use crate::ingest::store::{MicReport, SimStore, StoredEvent};
use crate::server::ws::Broadcaster;

/// A report joins a group only while within this span of the group's
/// earliest and latest members, microseconds.
pub const GROUP_SPAN_MICROS: i64 = 1_000_000;

/// Groups need this many distinct mics to count as a detection.
pub const MIN_MICS_PER_EVENT: usize = 3;

/// Quiet period after the latest report before a detection scan runs.
const DEBOUNCE_MILLIS: u64 = 1_000;

/// Width of the trailing window scanned on each detection pass.
const SCAN_WINDOW_MICROS: i64 = 2_000_000;

pub type SharedStore = Arc<RwLock<SimStore>>;

struct Group {
    reports: Vec<MicReport>,
    mic_ids: HashSet<u32>,
    min_time: i64,
    max_time: i64,
}

/// Partition time-sorted reports into candidate groups. A report merges
/// into the first group whose span it fits and whose mic set does not
/// already contain it; otherwise it seeds a new group.
fn group_reports(reports: &[MicReport]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for report in reports {
        let target = groups.iter_mut().find(|group| {
            (report.timestamp - group.min_time).abs() <= GROUP_SPAN_MICROS
                && (report.timestamp - group.max_time).abs() <= GROUP_SPAN_MICROS
                && !group.mic_ids.contains(&report.mic_id)
        });
        match target {
            Some(group) => {
                group.reports.push(*report);
                group.min_time = group.min_time.min(report.timestamp);
                group.max_time = group.max_time.max(report.timestamp);
                group.mic_ids.insert(report.mic_id);
            }
            None => groups.push(Group {
                reports: vec![*report],
                mic_ids: HashSet::from([report.mic_id]),
                min_time: report.timestamp,
                max_time: report.timestamp,
            }),
        }
    }
    groups
}

/// Run detection over one batch of time-sorted reports: groups with
/// enough distinct mics are reduced to one report per mic (first arrival
/// wins) and passed to the location estimator.
pub fn detect_events(reports: &[MicReport]) -> Vec<StoredEvent> {
    let mut events = Vec::new();
    for group in group_reports(reports) {
        if group.mic_ids.len() < MIN_MICS_PER_EVENT {
            continue;
        }

        let mut seen = HashSet::new();
        let unique: Vec<MicReport> = group
            .reports
            .iter()
            .filter(|report| seen.insert(report.mic_id))
            .copied()
            .collect();

        match estimate_location(&unique) {
            Some(location) => {
                let mut mic_ids: Vec<u32> = unique.iter().map(|report| report.mic_id).collect();
                mic_ids.sort_unstable();
                events.push(StoredEvent {
                    lat: location.lat,
                    lon: location.lon,
                    time: location.time,
                    mic_ids,
                });
            }
            None => warn!("location estimate failed for a {}-mic group", unique.len()),
        }
    }
    events
}

/// Debounced detector: ingestion notifies it with each report's arrival
/// timestamp; one second after the latest notification it scans the
/// trailing window, stores fresh detections, and broadcasts them.
#[derive(Clone)]
pub struct Detector {
    tx: mpsc::UnboundedSender<i64>,
}

impl Detector {
    pub fn spawn(store: SharedStore, broadcaster: Broadcaster) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_detector(rx, store, broadcaster));
        Self { tx }
    }

    pub fn notify(&self, timestamp_micros: i64) {
        let _ = self.tx.send(timestamp_micros);
    }
}

async fn run_detector(
    mut rx: mpsc::UnboundedReceiver<i64>,
    store: SharedStore,
    broadcaster: Broadcaster,
) {
    while let Some(first) = rx.recv().await {
        let mut latest = first;
        sleep(Duration::from_millis(DEBOUNCE_MILLIS)).await;
        // Collapse the burst that arrived during the quiet period.
        while let Ok(timestamp) = rx.try_recv() {
            latest = latest.max(timestamp);
        }

        let start = latest - SCAN_WINDOW_MICROS;
        let candidates = store
            .read()
            .map(|guard| guard.logs_between(start, latest))
            .unwrap_or_default();
        debug!("detection scan over {} reports", candidates.len());

        let detected = detect_events(&candidates);
        if detected.is_empty() {
            continue;
        }

        let fresh = store
            .write()
            .map(|mut guard| guard.record_events(detected))
            .unwrap_or_default();
        if fresh.is_empty() {
            continue;
        }

        info!("detected {} gunshot event(s)", fresh.len());
        let events: Vec<_> = fresh.iter().map(StoredEvent::to_gunshot_event).collect();
        broadcaster.send_gunshot_events(&events);
    }
}
