use serde::{Deserialize, Serialize};

/// One acoustic sensor ("mic") position. The collection is replaced
/// wholesale on every update; individual records are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sensor {
    pub mic_id: u32,
    pub lat: f64,
    pub lon: f64,
}

impl Sensor {
    pub fn new(mic_id: u32, lat: f64, lon: f64) -> Self {
        Self { mic_id, lat, lon }
    }
}
