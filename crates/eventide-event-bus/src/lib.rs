//! In-process publish/subscribe bus implementing `EventBus`.

pub mod in_memory;

pub use in_memory::InMemoryEventBus;
