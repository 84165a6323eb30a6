//! Shared, ordered log of collaborator calls.
//!
//! A store and a bus attached to the same `CallLog` record into one sequence,
//! which lets tests assert the relative order of appends and publishes.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// One call made against a recording collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `EventRepository::load_events`.
    Load {
        /// Requested aggregate.
        aggregate_id: Uuid,
        /// Requested stream.
        stream_name: String,
    },
    /// `EventRepository::append_events`.
    Append {
        /// Target stream.
        stream_name: String,
        /// Target aggregate.
        aggregate_id: Uuid,
        /// Expected version passed by the caller.
        expected_version: i64,
        /// IDs of the appended events, in batch order.
        event_ids: Vec<Uuid>,
    },
    /// `EventBus::publish`.
    Publish(Uuid),
    /// `EventBus::publish_and_acknowledge` was entered for an event.
    AcknowledgeStarted(Uuid),
    /// `EventBus::publish_and_acknowledge` returned for an event.
    AcknowledgeFinished(Uuid),
}

/// Cloneable handle to a shared call sequence.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<RecordedCall>>>);

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, call: RecordedCall) {
        self.0.lock().unwrap().push(call);
    }

    /// Returns a snapshot of every call so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }
}
