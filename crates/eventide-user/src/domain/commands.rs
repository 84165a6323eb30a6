//! Commands for the User context.

use eventide_core::command::Command;
use uuid::Uuid;

/// Command to register a new user.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The email address to register with.
    pub email: String,
}

impl Command for RegisterUser {
    fn command_type(&self) -> &'static str {
        "user.register"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to mark a user's email address as verified.
#[derive(Debug, Clone)]
pub struct VerifyEmail {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user identifier.
    pub user_id: Uuid,
}

impl Command for VerifyEmail {
    fn command_type(&self) -> &'static str {
        "user.verify_email"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change a user's email address.
#[derive(Debug, Clone)]
pub struct ChangeEmailAddress {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The user identifier.
    pub user_id: Uuid,
    /// The new email address.
    pub email: String,
}

impl Command for ChangeEmailAddress {
    fn command_type(&self) -> &'static str {
        "user.change_email_address"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
