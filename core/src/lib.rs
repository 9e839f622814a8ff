//! Core live-data engine for the acoustic gunshot platform.
//!
//! The modules own the reconnecting event feed, the time-windowed gunshot
//! event set, and the timestamp-to-triggering-sensor correlation consumed
//! by the map surface.

pub mod engine;
pub mod feed;
pub mod fetch;
pub mod model;
pub mod prelude;
pub mod telemetry;

pub use engine::{Engine, Selection, ViewModel};
pub use prelude::{EngineConfig, EngineError, EngineResult};
