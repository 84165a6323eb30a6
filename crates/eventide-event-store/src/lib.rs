//! Event store implementations of `EventRepository`.
//!
//! [`pg_event_repository::PgEventRepository`] is the durable store;
//! [`in_memory::InMemoryEventRepository`] keeps streams in process memory
//! for local runs and tests.

pub mod in_memory;
pub mod pg_event_repository;
pub mod schema;
