use serde::{Deserialize, Serialize};

/// Upstream location estimate for one detected shot. `time` is in
/// microseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimatedLocation {
    pub lat: f64,
    pub lon: f64,
    pub time: i64,
}

/// A gunshot event as delivered by the stream. Immutable once received;
/// evicted from the live set once it falls outside the relevance window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GunshotEvent {
    pub estimated_location: EstimatedLocation,
}

impl GunshotEvent {
    pub fn new(lat: f64, lon: f64, time: i64) -> Self {
        Self {
            estimated_location: EstimatedLocation { lat, lon, time },
        }
    }

    /// Event time in microseconds since the epoch.
    pub fn time_micros(&self) -> i64 {
        self.estimated_location.time
    }
}
