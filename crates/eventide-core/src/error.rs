//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),

    /// The request context deadline passed before the operation completed.
    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded {
        /// The collaborator call that was cut short.
        operation: &'static str,
    },

    /// The event store failed while loading or appending a stream.
    #[error("event store {operation} failed for {stream_name}/{aggregate_id}")]
    Store {
        /// `load` or `append`.
        operation: &'static str,
        /// The stream involved.
        stream_name: String,
        /// The aggregate involved.
        aggregate_id: Uuid,
        /// The underlying store error.
        #[source]
        source: Box<DomainError>,
    },

    /// A loaded stream could not be replayed into the aggregate.
    #[error("replaying {stream_name}/{aggregate_id} failed")]
    Replay {
        /// The stream involved.
        stream_name: String,
        /// The aggregate involved.
        aggregate_id: Uuid,
        /// The aggregate's decode error.
        #[source]
        source: Box<DomainError>,
    },

    /// The event bus failed to deliver an event that is already durable.
    #[error("publishing event {event_id} ({event_type}) at position {position} failed")]
    Publish {
        /// The event that could not be delivered.
        event_id: Uuid,
        /// Its type.
        event_type: String,
        /// 1-indexed position of the event within the saved batch.
        position: usize,
        /// The underlying bus error.
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    /// Returns `true` for the not-found sentinel.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AggregateNotFound(_))
    }

    /// Unwraps `Store`/`Replay`/`Publish` layers down to the collaborator's own error.
    #[must_use]
    pub fn root_cause(&self) -> &DomainError {
        match self {
            Self::Store { source, .. }
            | Self::Replay { source, .. }
            | Self::Publish { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_store_error_exposes_cause_through_source() {
        let aggregate_id = Uuid::new_v4();
        let err = DomainError::Store {
            operation: "append",
            stream_name: "user".to_owned(),
            aggregate_id,
            source: Box::new(DomainError::Infrastructure("connection refused".into())),
        };

        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "infrastructure error: connection refused");
        assert!(matches!(err.root_cause(), DomainError::Infrastructure(_)));
    }

    #[test]
    fn test_root_cause_of_nested_deadline_is_deadline() {
        let err = DomainError::Publish {
            event_id: Uuid::new_v4(),
            event_type: "user.registered".to_owned(),
            position: 2,
            source: Box::new(DomainError::DeadlineExceeded {
                operation: "publish",
            }),
        };

        assert!(matches!(
            err.root_cause(),
            DomainError::DeadlineExceeded { operation: "publish" }
        ));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found_only_for_sentinel() {
        assert!(DomainError::AggregateNotFound(Uuid::new_v4()).is_not_found());
        assert!(!DomainError::Validation("bad".into()).is_not_found());
    }
}
