//! In-memory event bus.
//!
//! Handlers subscribe per event type. `publish` spawns one task per handler
//! and returns immediately; `publish_and_acknowledge` runs the handlers in a
//! `JoinSet` and waits for all of them. Dropping an acknowledgement future
//! aborts the handler tasks it spawned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use eventide_core::bus::{EventBus, EventHandler};
use eventide_core::error::DomainError;
use eventide_core::repository::StoredEvent;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Process-local `EventBus` backed by a handler registry.
#[derive(Default)]
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
    closed: AtomicBool,
}

impl std::fmt::Debug for InMemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventBus")
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl InMemoryEventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every event whose type is `event_type`.
    pub fn subscribe(&self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let event_type = event_type.into();
        debug!(%event_type, handler = handler.name(), "handler subscribed");
        // The registry only ever grows, so a poisoned guard still holds a
        // consistent map.
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Stops accepting events. Handlers already running are unaffected.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn handlers_for(&self, event_type: &str) -> Result<Vec<Arc<dyn EventHandler>>, DomainError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("event bus is closed".into()));
        }
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        Ok(handlers.get(event_type).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: &StoredEvent) -> Result<(), DomainError> {
        for handler in self.handlers_for(&event.event_type)? {
            let event = event.clone();
            tokio::spawn(async move {
                if let Err(err) = handler.handle(&event).await {
                    warn!(
                        handler = handler.name(),
                        event_id = %event.event_id,
                        event_type = %event.event_type,
                        error = %err,
                        "event handler failed"
                    );
                }
            });
        }
        Ok(())
    }

    async fn publish_and_acknowledge(&self, event: &StoredEvent) -> Result<(), DomainError> {
        let handlers = self.handlers_for(&event.event_type)?;
        if handlers.is_empty() {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        for handler in handlers {
            let event = event.clone();
            tasks.spawn(async move {
                handler
                    .handle(&event)
                    .await
                    .map_err(|err| format!("{}: {err}", handler.name()))
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => failures.push(failure),
                Err(join_err) => failures.push(format!("handler task aborted: {join_err}")),
            }
        }

        if failures.is_empty() {
            debug!(event_id = %event.event_id, "event acknowledged");
            Ok(())
        } else {
            Err(DomainError::Infrastructure(format!(
                "{} handler(s) failed for {}: {}",
                failures.len(),
                event.event_type,
                failures.join("; ")
            )))
        }
    }
}
