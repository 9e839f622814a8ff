use serde::{Deserialize, Serialize};

/// One sensor's contribution to a detection at a second-granularity
/// timestamp. Fetched in bulk from the log store; never mutated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: i64,
    pub mic_id: u32,
}

impl LogEntry {
    pub fn new(timestamp: i64, mic_id: u32) -> Self {
        Self { timestamp, mic_id }
    }
}
