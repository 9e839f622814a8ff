use std::sync::{Arc, RwLock};

use log::{debug, error, info};

use crate::engine::{
    selector, DisplayEvent, EventWindow, LogIndex, Selection, SensorRegistry, LIVE_WINDOW_MICROS,
};
use crate::feed::FeedMessage;
use crate::fetch::ApiClient;
use crate::model::Sensor;
use crate::prelude::EngineConfig;
use crate::telemetry::FeedMetrics;

/// Process-wide state: sensors, live events, selection, and the log
/// snapshot. Init empty at startup; mutated only through [`Engine`]
/// operations, with last-write-wins replacement for the snapshots.
#[derive(Debug, Default)]
struct EngineState {
    registry: SensorRegistry,
    window: EventWindow,
    logs: LogIndex,
    selection: Selection,
}

/// One dropdown entry: a distinct log timestamp with its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampOption {
    pub seconds: i64,
    pub label: String,
}

/// Everything the render surface consumes for one frame.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub sensors: Vec<Sensor>,
    pub events: Vec<DisplayEvent>,
    pub timestamp_options: Vec<TimestampOption>,
    pub triggered_mic_ids: Vec<u32>,
    pub live: bool,
}

/// Shared handle over the engine state. Cheap to clone; the feed task and
/// the render surface each hold one.
#[derive(Clone)]
pub struct Engine {
    state: Arc<RwLock<EngineState>>,
    client: ApiClient,
    metrics: Arc<FeedMetrics>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState::default())),
            client: ApiClient::new(&config),
            metrics: Arc::new(FeedMetrics::new()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &FeedMetrics {
        &self.metrics
    }

    /// Apply one demultiplexed feed message, in arrival order. Gunshot
    /// batches are filtered to the live window before admission; entries
    /// already stale on arrival are dropped, not stored-then-evicted.
    pub fn apply(&self, message: FeedMessage, now_micros: i64) {
        let mut state = self.state.write().unwrap();
        match message {
            FeedMessage::SensorUpdate(sensors) => {
                debug!("sensor_update: {} sensors", sensors.len());
                state.registry.replace(sensors);
            }
            FeedMessage::GunshotEvents(events) => {
                let total = events.len();
                let recent: Vec<_> = events
                    .into_iter()
                    .filter(|event| now_micros - event.time_micros() <= LIVE_WINDOW_MICROS)
                    .collect();
                if recent.len() < total {
                    debug!("dropped {} stale gunshot events on arrival", total - recent.len());
                }
                state.window.append(now_micros, recent);
            }
        }
        self.metrics.record_applied();
    }

    /// Fetch the sensor list. On failure the registry resets to empty;
    /// the error is logged, never surfaced to the render path.
    pub async fn refresh_sensors(&self) {
        match self.client.get_sensors().await {
            Ok(sensors) => {
                info!("fetched {} sensors", sensors.len());
                self.state.write().unwrap().registry.replace(sensors);
            }
            Err(err) => {
                error!("sensor fetch failed: {err}");
                self.metrics.record_fetch_failure();
                self.state.write().unwrap().registry.clear();
            }
        }
    }

    /// Fetch the full log store. On failure the index resets to empty.
    pub async fn refresh_logs(&self) {
        match self.client.get_all_logs().await {
            Ok(logs) => {
                info!("fetched {} log entries", logs.len());
                self.state.write().unwrap().logs.replace(logs);
            }
            Err(err) => {
                error!("log fetch failed: {err}");
                self.metrics.record_fetch_failure();
                self.state.write().unwrap().logs.clear();
            }
        }
    }

    /// Enter history mode at the given log timestamp.
    pub fn select_timestamp(&self, ts_secs: f64) {
        self.state.write().unwrap().selection = Selection::at_seconds(ts_secs);
    }

    /// Explicit reset back to live mode.
    pub fn clear_selection(&self) {
        self.state.write().unwrap().selection = Selection::Live;
    }

    pub fn selection(&self) -> Selection {
        self.state.read().unwrap().selection
    }

    /// Arithmetic-mean center of the current sensors, for the "center map"
    /// request. `None` (no-op) when the registry is empty.
    pub fn recenter(&self) -> Option<(f64, f64)> {
        let center = self.state.read().unwrap().registry.center();
        if let Some((lat, lon)) = center {
            info!("recenter requested: ({lat:.5}, {lon:.5})");
        }
        center
    }

    /// Assemble the frame for the render surface at `now_micros`.
    pub fn view(&self, now_micros: i64) -> ViewModel {
        let state = self.state.read().unwrap();
        let selection = state.selection;
        let triggered = selector::triggered_mic_ids(selection, &state.logs);
        let sensors = selector::visible_sensors(&state.registry.snapshot(), &triggered);
        let events = selector::visible_events(selection, now_micros, &state.window);
        let timestamp_options = state
            .logs
            .timestamps()
            .iter()
            .map(|&seconds| TimestampOption {
                seconds,
                label: selector::timestamp_label(seconds),
            })
            .collect();

        ViewModel {
            sensors,
            events,
            timestamp_options,
            triggered_mic_ids: triggered,
            live: selection.is_live(),
        }
    }
}
