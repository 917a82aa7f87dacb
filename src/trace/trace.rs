use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::replay::event::RecordedEvent;

/// One line of the replay trace.
#[derive(Debug, Serialize)]
pub struct ReplayTraceEvent {
    pub timestamp_ms: u128,
    pub index: usize,

    pub event_id: String,
    pub kind: String,
    pub window_key: String,

    pub outcome: String,
    pub error: Option<String>,

    pub duration_ms: Option<u128>,
    pub data_keys: Option<usize>,
}

impl ReplayTraceEvent {
    pub fn now(index: usize, event: &RecordedEvent) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            index,
            event_id: event.id.clone(),
            kind: event.kind().to_string(),
            window_key: event.window_key(),
            outcome: "ok".to_string(),
            error: None,
            duration_ms: None,
            data_keys: None,
        }
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.outcome = "failed".to_string();
        self.error = Some(error.to_string());
        self
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_data_keys(mut self, count: usize) -> Self {
        self.data_keys = Some(count);
        self
    }
}
