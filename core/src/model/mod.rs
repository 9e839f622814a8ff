pub mod gunshot;
pub mod log_entry;
pub mod sensor;

pub use gunshot::{EstimatedLocation, GunshotEvent};
pub use log_entry::LogEntry;
pub use sensor::Sensor;
