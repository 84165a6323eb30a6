//! Command handlers for the User context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use eventide_core::aggregate::AggregateRoot;
use eventide_core::command::Command;
use eventide_core::context::{Clock, RequestContext};
use eventide_core::error::DomainError;
use eventide_core::event::DomainEvent;
use eventide_core::event_sourced::EventSourcedRepository;
use eventide_core::repository::StoredEvent;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::User;
use crate::domain::commands::{ChangeEmailAddress, RegisterUser, VerifyEmail};

/// Event-sourced repository for [`User`] aggregates.
pub type UserRepository = EventSourcedRepository<User>;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct UserCommandResult {
    /// The aggregate ID affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

fn pending_stored_events(user: &User) -> Vec<StoredEvent> {
    user.uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored_event)
        .collect()
}

/// Handles the `RegisterUser` command: creates a new aggregate, registers it
/// and persists the resulting events, waiting until every subscriber has
/// processed them.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the email is malformed, or the
/// repository's store/publish error.
#[instrument(skip_all, fields(command = command.command_type(), correlation_id = %command.correlation_id))]
pub async fn handle_register_user(
    command: &RegisterUser,
    ctx: &RequestContext,
    clock: &dyn Clock,
    repo: &UserRepository,
) -> Result<UserCommandResult, DomainError> {
    let user_id = Uuid::new_v4();
    let mut user = User::new(user_id);

    user.register(&command.email, command.correlation_id, clock)?;

    let stored_events = pending_stored_events(&user);
    repo.save_and_acknowledge(ctx, &mut user).await?;

    info!(%user_id, "user registered");
    Ok(UserCommandResult {
        aggregate_id: user_id,
        stored_events,
    })
}

/// Handles the `VerifyEmail` command: reconstitutes the aggregate, verifies
/// its email and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the user does not exist,
/// `DomainError::Validation` if the email is already verified, or the
/// repository's store/publish error.
#[instrument(skip_all, fields(command = command.command_type(), user_id = %command.user_id))]
pub async fn handle_verify_email(
    command: &VerifyEmail,
    ctx: &RequestContext,
    clock: &dyn Clock,
    repo: &UserRepository,
) -> Result<UserCommandResult, DomainError> {
    let mut user = repo.get(ctx, command.user_id).await?;

    user.verify_email(command.correlation_id, clock)?;

    let stored_events = pending_stored_events(&user);
    repo.save(ctx, &mut user).await?;

    Ok(UserCommandResult {
        aggregate_id: command.user_id,
        stored_events,
    })
}

/// Handles the `ChangeEmailAddress` command: reconstitutes the aggregate,
/// changes its address and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the user does not exist,
/// `DomainError::Validation` if the address is malformed or unchanged, or the
/// repository's store/publish error.
#[instrument(skip_all, fields(command = command.command_type(), user_id = %command.user_id))]
pub async fn handle_change_email_address(
    command: &ChangeEmailAddress,
    ctx: &RequestContext,
    clock: &dyn Clock,
    repo: &UserRepository,
) -> Result<UserCommandResult, DomainError> {
    let mut user = repo.get(ctx, command.user_id).await?;

    user.change_email_address(&command.email, command.correlation_id, clock)?;

    let stored_events = pending_stored_events(&user);
    repo.save(ctx, &mut user).await?;

    Ok(UserCommandResult {
        aggregate_id: command.user_id,
        stored_events,
    })
}
