//! Test buses — fake `EventBus` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::bus::EventBus;
use eventide_core::error::DomainError;
use eventide_core::repository::StoredEvent;

use crate::call_log::{CallLog, RecordedCall};

/// An event bus that records every event it is given.
///
/// Optionally fails the K-th publish call (1-indexed, counted across both
/// publish methods) and delays each acknowledgement to make sequencing
/// observable.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<StoredEvent>>,
    call_count: AtomicUsize,
    fail_at: Option<usize>,
    ack_delay: Option<Duration>,
    call_log: CallLog,
}

impl RecordingEventBus {
    /// Creates a bus that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the publish call at `position` (1-indexed).
    #[must_use]
    pub fn failing_at(mut self, position: usize) -> Self {
        self.fail_at = Some(position);
        self
    }

    /// Sleeps for `delay` inside every `publish_and_acknowledge` call.
    #[must_use]
    pub fn with_ack_delay(mut self, delay: Duration) -> Self {
        self.ack_delay = Some(delay);
        self
    }

    /// Records calls into `call_log` as well.
    #[must_use]
    pub fn with_call_log(mut self, call_log: CallLog) -> Self {
        self.call_log = call_log;
        self
    }

    /// Returns the events accepted so far, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published_events(&self) -> Vec<StoredEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns how many publish calls were made, failed ones included.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn accept(&self, event: &StoredEvent) -> Result<(), DomainError> {
        let position = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(position) {
            return Err(DomainError::Infrastructure(format!(
                "broker rejected event at position {position}"
            )));
        }
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError> {
        self.call_log.record(RecordedCall::Publish(event.event_id));
        self.accept(event)
    }

    async fn publish_and_acknowledge(&self, event: &StoredEvent) -> Result<(), DomainError> {
        self.call_log
            .record(RecordedCall::AcknowledgeStarted(event.event_id));
        if let Some(delay) = self.ack_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.accept(event);
        self.call_log
            .record(RecordedCall::AcknowledgeFinished(event.event_id));
        result
    }
}

/// An event bus whose every publish fails. Useful for testing the
/// stored-but-not-published path.
#[derive(Debug)]
pub struct FailingEventBus;

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(&self, _event: &StoredEvent) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("broker unavailable".into()))
    }

    async fn publish_and_acknowledge(&self, _event: &StoredEvent) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("handler failed".into()))
    }
}
