//! Test repositories — fake `EventRepository` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use eventide_core::error::DomainError;
use eventide_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

use crate::call_log::{CallLog, RecordedCall};

/// An event repository that keeps appended events in memory and records every
/// `load_events` and `append_events` call.
///
/// Loads return the seeded and appended events matching the requested
/// aggregate and stream, so a save followed by a get round-trips. Appends are
/// not version-checked.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    events: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(String, Uuid, i64, Vec<StoredEvent>)>>,
    call_log: CallLog,
}

impl RecordingEventRepository {
    /// Creates an empty recording repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording repository pre-seeded with `events`.
    #[must_use]
    pub fn with_events(events: Vec<StoredEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    /// Records calls into `call_log` as well.
    #[must_use]
    pub fn with_call_log(mut self, call_log: CallLog) -> Self {
        self.call_log = call_log;
        self
    }

    /// Returns a snapshot of all append calls as
    /// `(stream_name, aggregate_id, expected_version, events)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(String, Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns the number of `append_events` calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn append_count(&self) -> usize {
        self.appended.lock().unwrap().len()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(
        &self,
        aggregate_id: Uuid,
        stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.call_log.record(RecordedCall::Load {
            aggregate_id,
            stream_name: stream_name.to_owned(),
        });
        let mut events: Vec<StoredEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.stream_name == stream_name)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.sequence_number);
        Ok(events)
    }

    async fn append_events(
        &self,
        stream_name: &str,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.call_log.record(RecordedCall::Append {
            stream_name: stream_name.to_owned(),
            aggregate_id,
            expected_version,
            event_ids: events.iter().map(|e| e.event_id).collect(),
        });
        self.appended.lock().unwrap().push((
            stream_name.to_owned(),
            aggregate_id,
            expected_version,
            events.to_vec(),
        ));
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(
        &self,
        _aggregate_id: Uuid,
        _stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _stream_name: &str,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingEventRepository {
    call_log: CallLog,
}

impl FailingEventRepository {
    /// Creates a failing repository that records its calls into `call_log`.
    #[must_use]
    pub fn with_call_log(call_log: CallLog) -> Self {
        Self { call_log }
    }
}

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(
        &self,
        aggregate_id: Uuid,
        stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        self.call_log.record(RecordedCall::Load {
            aggregate_id,
            stream_name: stream_name.to_owned(),
        });
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        stream_name: &str,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.call_log.record(RecordedCall::Append {
            stream_name: stream_name.to_owned(),
            aggregate_id,
            expected_version,
            event_ids: events.iter().map(|e| e.event_id).collect(),
        });
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An event repository whose calls sleep for a fixed delay before
/// succeeding. Useful for testing deadlines on store calls.
#[derive(Debug)]
pub struct HangingEventRepository {
    delay: Duration,
    completed: AtomicUsize,
}

impl HangingEventRepository {
    /// Creates a repository whose every call takes `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            completed: AtomicUsize::new(0),
        }
    }

    /// Returns how many calls ran to completion.
    pub fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventRepository for HangingEventRepository {
    async fn load_events(
        &self,
        _aggregate_id: Uuid,
        _stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _stream_name: &str,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
