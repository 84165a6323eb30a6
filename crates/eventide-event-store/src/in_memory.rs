//! In-memory event store.
//!
//! Streams live in a `HashMap` keyed by `(stream_name, aggregate_id)` behind a
//! `RwLock`. A batch is checked and appended under a single write lock, which
//! makes appends atomic with respect to each other.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use eventide_core::error::DomainError;
use eventide_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

type StreamKey = (String, Uuid);

/// Thread-safe in-memory event repository with optimistic concurrency.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<StreamKey, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("in-memory event store lock poisoned".into())
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(
        &self,
        aggregate_id: Uuid,
        stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self.streams.read().map_err(|_| poisoned())?;
        Ok(streams
            .get(&(stream_name.to_owned(), aggregate_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        stream_name: &str,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut streams = self.streams.write().map_err(|_| poisoned())?;
        let stream = streams
            .entry((stream_name.to_owned(), aggregate_id))
            .or_default();

        let actual = stream.last().map_or(0, |e| e.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        stream.extend(events.iter().map(|event| StoredEvent {
            stream_name: stream_name.to_owned(),
            aggregate_id,
            ..event.clone()
        }));
        Ok(())
    }
}
