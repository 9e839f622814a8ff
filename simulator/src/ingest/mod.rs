pub mod detect;
pub mod locate;
pub mod store;

pub use detect::Detector;
pub use store::{IngestOutcome, MicReport, SimStore, StoredEvent};
