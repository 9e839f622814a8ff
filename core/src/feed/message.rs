use serde::Deserialize;

use crate::model::{GunshotEvent, Sensor};
use crate::prelude::{EngineError, EngineResult};

/// One inbound frame after demultiplexing by discriminant.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    SensorUpdate(Vec<Sensor>),
    GunshotEvents(Vec<GunshotEvent>),
}

/// Raw shape of a frame before classification. Sensor updates carry a
/// `type` tag; gunshot batches are identified by the presence of a
/// non-empty `gunshot_events` list.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    sensors: Option<Vec<Sensor>>,
    #[serde(default)]
    gunshot_events: Option<Vec<GunshotEvent>>,
}

/// Parse one text frame. `Ok(None)` is a well-formed frame the engine does
/// not consume (unknown type, or an empty event list).
pub fn parse_frame(text: &str) -> EngineResult<Option<FeedMessage>> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|err| EngineError::MalformedMessage(err.to_string()))?;

    if raw.kind.as_deref() == Some("sensor_update") {
        return match raw.sensors {
            Some(sensors) => Ok(Some(FeedMessage::SensorUpdate(sensors))),
            None => Err(EngineError::MalformedMessage(
                "sensor_update without a sensors list".into(),
            )),
        };
    }

    match raw.gunshot_events {
        Some(events) if !events.is_empty() => Ok(Some(FeedMessage::GunshotEvents(events))),
        _ => Ok(None),
    }
}
