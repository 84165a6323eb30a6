//! Event-sourced aggregate repository.
//!
//! Persists an aggregate's pending events as one batch and then forwards each
//! event to the bus, either fire-and-forget ([`EventSourcedRepository::save`])
//! or waiting for every handler ([`EventSourcedRepository::save_and_acknowledge`]).
//!
//! The store append and the publishes are not one transaction. Once the
//! append succeeds the events are durable; a publish failure after that point
//! is returned to the caller and the remaining events of the batch are not
//! published. Re-delivery from the stream is left to the caller.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::bus::EventBus;
use crate::context::RequestContext;
use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::repository::{EventRepository, StoredEvent};

/// Which bus primitive a save uses for each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// `EventBus::publish`.
    FireAndForget,
    /// `EventBus::publish_and_acknowledge`, one event at a time.
    Acknowledged,
}

impl Delivery {
    fn operation(self) -> &'static str {
        match self {
            Self::FireAndForget => "publish",
            Self::Acknowledged => "publish_and_acknowledge",
        }
    }
}

/// Repository that stores and rehydrates aggregates of type `A` through an
/// event store, broadcasting every stored event on an event bus.
pub struct EventSourcedRepository<A> {
    store: Arc<dyn EventRepository>,
    bus: Arc<dyn EventBus>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> Clone for EventSourcedRepository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            bus: Arc::clone(&self.bus),
            _aggregate: PhantomData,
        }
    }
}

impl<A> std::fmt::Debug for EventSourcedRepository<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcedRepository")
            .field("aggregate", &std::any::type_name::<A>())
            .finish_non_exhaustive()
    }
}

impl<A: AggregateRoot> EventSourcedRepository<A> {
    /// Creates a repository over the given store and bus.
    #[must_use]
    pub fn new(store: Arc<dyn EventRepository>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            store,
            bus,
            _aggregate: PhantomData,
        }
    }

    /// Stores the aggregate's pending events and publishes each of them
    /// without waiting for handlers.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Store` if the append fails (nothing is
    /// published), or `DomainError::Publish` if a publish fails (the events
    /// are already durable).
    pub async fn save(&self, ctx: &RequestContext, aggregate: &mut A) -> Result<(), DomainError> {
        self.persist_and_publish(ctx, aggregate, Delivery::FireAndForget)
            .await
    }

    /// Stores the aggregate's pending events and publishes them one by one,
    /// returning only after every handler of every event has finished.
    ///
    /// # Errors
    ///
    /// Same as [`Self::save`]; a handler failure surfaces as
    /// `DomainError::Publish`.
    pub async fn save_and_acknowledge(
        &self,
        ctx: &RequestContext,
        aggregate: &mut A,
    ) -> Result<(), DomainError> {
        self.persist_and_publish(ctx, aggregate, Delivery::Acknowledged)
            .await
    }

    /// Loads the aggregate's stream and replays it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the stream is empty,
    /// `DomainError::Store` if loading fails, or `DomainError::Replay` if an
    /// event cannot be decoded.
    #[instrument(
        skip(self, ctx),
        fields(stream = A::STREAM_NAME, correlation_id = %ctx.correlation_id())
    )]
    pub async fn get(&self, ctx: &RequestContext, aggregate_id: Uuid) -> Result<A, DomainError> {
        let events = ctx
            .run("load", self.store.load_events(aggregate_id, A::STREAM_NAME))
            .await
            .map_err(|source| store_error("load", A::STREAM_NAME, aggregate_id, source))?;

        if events.is_empty() {
            debug!("no events in stream");
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }

        debug!(event_count = events.len(), "replaying stream");
        A::from_history(aggregate_id, &events).map_err(|source| DomainError::Replay {
            stream_name: A::STREAM_NAME.to_owned(),
            aggregate_id,
            source: Box::new(source),
        })
    }

    #[instrument(
        skip(self, ctx, aggregate),
        fields(
            stream = A::STREAM_NAME,
            aggregate_id = %aggregate.aggregate_id(),
            correlation_id = %ctx.correlation_id(),
        )
    )]
    async fn persist_and_publish(
        &self,
        ctx: &RequestContext,
        aggregate: &mut A,
        delivery: Delivery,
    ) -> Result<(), DomainError> {
        if aggregate.uncommitted_events().is_empty() {
            return Ok(());
        }

        let aggregate_id = aggregate.aggregate_id();
        let expected_version = aggregate.committed_version();
        let batch: Vec<StoredEvent> = aggregate
            .uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored_event)
            .collect();

        ctx.run(
            "append",
            self.store
                .append_events(A::STREAM_NAME, aggregate_id, expected_version, &batch),
        )
        .await
        .map_err(|source| store_error("append", A::STREAM_NAME, aggregate_id, source))?;

        aggregate.clear_uncommitted_events();
        debug!(event_count = batch.len(), "events appended");

        for (index, event) in batch.iter().enumerate() {
            let published = match delivery {
                Delivery::FireAndForget => {
                    ctx.run(delivery.operation(), self.bus.publish(event)).await
                }
                Delivery::Acknowledged => {
                    ctx.run(delivery.operation(), self.bus.publish_and_acknowledge(event))
                        .await
                }
            };

            if let Err(source) = published {
                warn!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    position = index + 1,
                    error = %source,
                    "publish failed after events were stored"
                );
                return Err(DomainError::Publish {
                    event_id: event.event_id,
                    event_type: event.event_type.clone(),
                    position: index + 1,
                    source: Box::new(source),
                });
            }

            debug!(event_id = %event.event_id, event_type = %event.event_type, "event published");
        }

        Ok(())
    }
}

fn store_error(
    operation: &'static str,
    stream_name: &str,
    aggregate_id: Uuid,
    source: DomainError,
) -> DomainError {
    DomainError::Store {
        operation,
        stream_name: stream_name.to_owned(),
        aggregate_id,
        source: Box::new(source),
    }
}
