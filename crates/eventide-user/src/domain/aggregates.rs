//! Aggregate roots for the User context.

use eventide_core::aggregate::AggregateRoot;
use eventide_core::context::Clock;
use eventide_core::error::DomainError;
use eventide_core::event::EventMetadata;
use eventide_core::repository::StoredEvent;
use uuid::Uuid;

use super::events::{
    EmailAddressChanged, EmailVerified, UserEvent, UserEventKind, UserRegistered,
};

/// Stream holding the events of every user.
pub const USER_STREAM_NAME: &str = "user";

/// The aggregate root for a user account.
#[derive(Debug)]
pub struct User {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count, pending events included).
    pub(crate) version: i64,
    /// Current email address; `None` until registered.
    pub(crate) email: Option<String>,
    /// Whether the current email address has been verified.
    pub(crate) email_verified: bool,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<UserEvent>,
}

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_owned()),
        _ => Err(DomainError::Validation(format!(
            "invalid email address: {email:?}"
        ))),
    }
}

impl User {
    /// Current email address, if registered.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Whether the current email address has been verified.
    #[must_use]
    pub fn is_email_verified(&self) -> bool {
        self.email_verified
    }

    fn registered_email(&self) -> Result<&str, DomainError> {
        self.email
            .as_deref()
            .ok_or(DomainError::AggregateNotFound(self.id))
    }

    /// Applies `kind` to the in-memory state and queues it for persistence.
    fn record(&mut self, kind: UserEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = UserEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                stream_name: USER_STREAM_NAME.to_owned(),
                sequence_number: self.version + 1,
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.apply(&event);
        self.uncommitted_events.push(event);
    }

    /// Registers the user with `email`, producing a `UserRegistered` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the email is malformed or the
    /// user is already registered.
    pub fn register(
        &mut self,
        email: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.email.is_some() {
            return Err(DomainError::Validation(format!(
                "user {} is already registered",
                self.id
            )));
        }
        let email = validate_email(email)?;
        self.record(
            UserEventKind::UserRegistered(UserRegistered {
                user_id: self.id,
                email,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Marks the current email as verified, producing an `EmailVerified`
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the user never registered,
    /// or `DomainError::Validation` if the email is already verified.
    pub fn verify_email(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        let email = self.registered_email()?.to_owned();
        if self.email_verified {
            return Err(DomainError::Validation(format!(
                "email {email} is already verified"
            )));
        }
        self.record(
            UserEventKind::EmailVerified(EmailVerified {
                user_id: self.id,
                email,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Switches to a new email address, producing an `EmailAddressChanged`
    /// event. The new address starts out unverified.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the user never registered,
    /// or `DomainError::Validation` if the address is malformed or unchanged.
    pub fn change_email_address(
        &mut self,
        email: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let previous_email = self.registered_email()?.to_owned();
        let email = validate_email(email)?;
        if email == previous_email {
            return Err(DomainError::Validation(format!(
                "email address is already {email}"
            )));
        }
        self.record(
            UserEventKind::EmailAddressChanged(EmailAddressChanged {
                user_id: self.id,
                previous_email,
                email,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for User {
    type Event = UserEvent;

    const STREAM_NAME: &'static str = USER_STREAM_NAME;

    fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            email: None,
            email_verified: false,
            uncommitted_events: Vec::new(),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            UserEventKind::UserRegistered(payload) => {
                self.email = Some(payload.email.clone());
                self.email_verified = false;
            }
            UserEventKind::EmailVerified(_) => {
                self.email_verified = true;
            }
            UserEventKind::EmailAddressChanged(payload) => {
                self.email = Some(payload.email.clone());
                self.email_verified = false;
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }

    fn decode_event(stored: &StoredEvent) -> Result<Self::Event, DomainError> {
        let kind: UserEventKind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })?;
        Ok(UserEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        })
    }
}
