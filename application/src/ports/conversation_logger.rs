//! Port for structured transcript logging.
//!
//! Defines the [`ConversationLogger`] trait for recording deliberation
//! events (session formation, completed rounds, memory speech, conclusion)
//! to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the
//! deliberation transcript in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured deliberation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. Writers add the timestamp.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "session_formed", "round_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging deliberation events to a structured log.
///
/// The `log` method is synchronous and non-fallible so that a broken log
/// file never disturbs a running session; write failures are ignored.
pub trait ConversationLogger: Send + Sync {
    /// Record a deliberation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
