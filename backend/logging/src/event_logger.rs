//! Command Event Logger
//!
//! Structured command lifecycle events (dispatched, failed) emitted through
//! `tracing` under the `command_events` target, so a JSON file layer turns
//! them into NDJSON records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Dispatched {
        command: String,
        text: String,
    },
    Failed {
        command: Option<String>,
        text: String,
        stage: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub peer_id: i64,
    pub timestamp: DateTime<Utc>,
    pub event: CommandEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit one command event. Returns the entry that was logged.
    pub fn log_event(peer_id: i64, mut event: CommandEvent) -> EventLogEntry {
        match &mut event {
            CommandEvent::Dispatched { text, .. } => {
                *text = redact_sensitive_data(text);
            }
            CommandEvent::Failed { text, error, .. } => {
                *text = redact_sensitive_data(text);
                *error = redact_sensitive_data(error);
            }
        }

        let entry = EventLogEntry {
            peer_id,
            timestamp: Utc::now(),
            event,
        };

        let payload = serde_json::to_string(&entry).unwrap_or_else(|_| format!("{entry:?}"));
        match &entry.event {
            CommandEvent::Dispatched { .. } => {
                info!(target: "command_events", peer_id, event = %payload, "Command event");
            }
            CommandEvent::Failed { .. } => {
                warn!(target: "command_events", peer_id, event = %payload, "Command event");
            }
        }
        entry
    }
}
