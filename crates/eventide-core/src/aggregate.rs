//! Aggregate root abstraction.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::repository::StoredEvent;

/// Trait for aggregate roots that reconstitute from event history.
///
/// Business methods record events by applying them to the in-memory state and
/// queuing them as uncommitted, so `version()` always includes pending
/// changes.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Name of the stream holding every event of this aggregate type.
    const STREAM_NAME: &'static str;

    /// Creates an empty aggregate with no history.
    fn new(id: Uuid) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Apply an event to mutate internal state (used during reconstitution).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Decodes one stored record back into this aggregate's event type.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload cannot be decoded.
    fn decode_event(stored: &StoredEvent) -> Result<Self::Event, DomainError>;

    /// Version of the aggregate as last persisted, i.e. excluding pending
    /// changes. Used as the expected version when appending.
    #[allow(clippy::cast_possible_wrap)]
    fn committed_version(&self) -> i64 {
        self.version() - self.uncommitted_events().len() as i64
    }

    /// Rebuilds an aggregate by replaying its ordered history from empty
    /// state. The result has no uncommitted events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if any event fails to decode.
    fn from_history(aggregate_id: Uuid, history: &[StoredEvent]) -> Result<Self, DomainError> {
        let mut aggregate = Self::new(aggregate_id);
        for stored in history {
            let event = Self::decode_event(stored)?;
            aggregate.apply(&event);
        }
        Ok(aggregate)
    }
}
