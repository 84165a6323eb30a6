//! Domain events for the User context.

use eventide_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a user registers with an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    /// The user identifier.
    pub user_id: Uuid,
    /// The email address registered with.
    pub email: String,
}

/// Emitted when a user confirms ownership of their email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerified {
    /// The user identifier.
    pub user_id: Uuid,
    /// The address that was verified.
    pub email: String,
}

/// Emitted when a user switches to a different email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddressChanged {
    /// The user identifier.
    pub user_id: Uuid,
    /// The previous address.
    pub previous_email: String,
    /// The new, unverified address.
    pub email: String,
}

/// Event type identifier for [`UserRegistered`].
pub const USER_REGISTERED_EVENT_TYPE: &str = "user.registered";

/// Event type identifier for [`EmailVerified`].
pub const EMAIL_VERIFIED_EVENT_TYPE: &str = "user.email_verified";

/// Event type identifier for [`EmailAddressChanged`].
pub const EMAIL_ADDRESS_CHANGED_EVENT_TYPE: &str = "user.email_address_changed";

/// Event payload variants for the User context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserEventKind {
    /// A user has registered.
    UserRegistered(UserRegistered),
    /// A user's email has been verified.
    EmailVerified(EmailVerified),
    /// A user's email address has changed.
    EmailAddressChanged(EmailAddressChanged),
}

impl UserEventKind {
    /// Returns the event type name of this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::UserRegistered(_) => USER_REGISTERED_EVENT_TYPE,
            Self::EmailVerified(_) => EMAIL_VERIFIED_EVENT_TYPE,
            Self::EmailAddressChanged(_) => EMAIL_ADDRESS_CHANGED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the User context.
#[derive(Debug, Clone)]
pub struct UserEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: UserEventKind,
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("UserEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
