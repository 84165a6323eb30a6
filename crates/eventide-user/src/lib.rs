//! Eventide — User bounded context.
//!
//! Registration and email verification of users, persisted through the
//! event-sourced repository.

pub mod application;
pub mod domain;
