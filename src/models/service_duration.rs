use serde::{Deserialize, Serialize};

/// Per-service appointment length plus the idle buffer before the next slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDuration {
    pub service: String,
    pub duration_minutes: i32,
    pub buffer_minutes: i32,
}

/// Fallback appointment length when a service has no stored record.
pub const DEFAULT_DURATION_MINUTES: i32 = 30;

impl ServiceDuration {
    pub fn slot_step_minutes(&self) -> i32 {
        self.duration_minutes + self.buffer_minutes
    }
}
