//! Structured logging for chatcmd.
//!
//! Handles subscriber setup (console plus optional rolling JSON files),
//! redaction of secrets in logged text, and structured command events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CommandEvent, EventLogEntry, EventLogger};
pub use logger::{LogOptions, init_logger};
pub use redact::redact_sensitive_data;
