//! Eventide Core — event-sourced aggregate abstractions.
//!
//! This crate defines the traits every collaborator implements (event store,
//! event bus, aggregates) and the [`event_sourced::EventSourcedRepository`]
//! that ties them together. It contains no infrastructure code.

pub mod aggregate;
pub mod bus;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod event_sourced;
pub mod repository;
