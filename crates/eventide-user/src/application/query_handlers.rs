//! Query handlers for the User context.
//!
//! This module contains query handlers that reconstitute aggregates
//! through the repository and return read-only view DTOs.

use eventide_core::aggregate::AggregateRoot;
use eventide_core::context::RequestContext;
use eventide_core::error::DomainError;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::UserRepository;

/// Read-only view of a user aggregate.
#[derive(Debug, Serialize)]
pub struct UserView {
    /// The user identifier.
    pub user_id: Uuid,
    /// Current email address.
    pub email: Option<String>,
    /// Whether the current email address has been verified.
    pub email_verified: bool,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a user by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// or a `DomainError::Store` wrapping the loader's failure.
pub async fn get_user_by_id(
    ctx: &RequestContext,
    user_id: Uuid,
    repo: &UserRepository,
) -> Result<UserView, DomainError> {
    let user = repo.get(ctx, user_id).await?;
    Ok(UserView {
        user_id,
        email: user.email().map(str::to_owned),
        email_verified: user.is_email_verified(),
        version: user.version(),
    })
}
