//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use eventide_core::bus::EventBus;
use eventide_core::context::Clock;
use eventide_core::repository::EventRepository;
use eventide_user::application::command_handlers::UserRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock for deterministic time.
    pub clock: Arc<dyn Clock>,
    /// Event-sourced repository for users.
    pub users: UserRepository,
    /// Deadline given to each request's repository calls.
    pub request_timeout: Duration,
    /// Name of the event store backend, reported by the health check.
    pub event_store: &'static str,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("users", &self.users)
            .field("request_timeout", &self.request_timeout)
            .field("event_store", &self.event_store)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        event_repository: Arc<dyn EventRepository>,
        event_bus: Arc<dyn EventBus>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            clock,
            users: UserRepository::new(event_repository, event_bus),
            request_timeout,
            event_store: "in-memory",
        }
    }

    /// Sets the event store name reported by the health check.
    #[must_use]
    pub fn with_event_store_name(mut self, name: &'static str) -> Self {
        self.event_store = name;
        self
    }
}
