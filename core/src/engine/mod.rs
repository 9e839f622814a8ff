pub mod log_index;
pub mod registry;
pub mod selector;
pub mod state;
pub mod window;

pub use log_index::LogIndex;
pub use registry::SensorRegistry;
pub use selector::{DisplayEvent, Selection};
pub use state::{Engine, TimestampOption, ViewModel};
pub use window::EventWindow;

/// Events older than this are no longer current in live mode.
pub const LIVE_WINDOW_MICROS: i64 = 10_000_000;

/// Half-width of the correlation window around a selected historical
/// instant. Targets one detection instant, not a rolling span.
pub const HISTORY_WINDOW_MICROS: i64 = 50_000;

/// Log entries within this many seconds of a selected instant count as
/// having triggered.
pub const LOG_MATCH_TOLERANCE_SECS: f64 = 1.0;

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_micros() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as i64)
        .unwrap_or(0)
}
