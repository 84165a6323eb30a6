//! Event subscribers wired onto the bus at startup.

use std::sync::Arc;

use async_trait::async_trait;
use eventide_core::bus::EventHandler;
use eventide_core::error::DomainError;
use eventide_core::repository::StoredEvent;
use eventide_event_bus::InMemoryEventBus;
use eventide_user::domain::events::{
    EMAIL_ADDRESS_CHANGED_EVENT_TYPE, EMAIL_VERIFIED_EVENT_TYPE, USER_REGISTERED_EVENT_TYPE,
};
use tracing::info;

/// Writes one structured log line per delivered event.
#[derive(Debug, Default)]
pub struct EventLogger;

#[async_trait]
impl EventHandler for EventLogger {
    fn name(&self) -> &str {
        "event_logger"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<(), DomainError> {
        info!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            stream_name = %event.stream_name,
            aggregate_id = %event.aggregate_id,
            sequence_number = event.sequence_number,
            correlation_id = %event.correlation_id,
            "event delivered"
        );
        Ok(())
    }
}

/// Subscribes the default handlers to every user event type.
pub fn register_default_subscribers(bus: &InMemoryEventBus) {
    let logger: Arc<dyn EventHandler> = Arc::new(EventLogger);
    for event_type in [
        USER_REGISTERED_EVENT_TYPE,
        EMAIL_VERIFIED_EVENT_TYPE,
        EMAIL_ADDRESS_CHANGED_EVENT_TYPE,
    ] {
        bus.subscribe(event_type, Arc::clone(&logger));
    }
}
