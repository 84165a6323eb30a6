//! Event bus abstraction.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Publish/subscribe transport for stored events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Enqueue an event for delivery. Returns before subscribed handlers
    /// necessarily ran.
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError>;

    /// Deliver an event and wait until every handler subscribed to its type
    /// has finished. A failing handler is reported as an error.
    async fn publish_and_acknowledge(&self, event: &StoredEvent) -> Result<(), DomainError>;
}

/// A subscriber invoked by the bus for each event of the types it is
/// registered for.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handler name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Process one event.
    async fn handle(&self, event: &StoredEvent) -> Result<(), DomainError>;
}
