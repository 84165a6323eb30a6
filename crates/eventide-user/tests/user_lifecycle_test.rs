//! End-to-end tests of the User context over the in-memory store and bus.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use eventide_core::bus::EventHandler;
use eventide_core::context::RequestContext;
use eventide_core::error::DomainError;
use eventide_core::repository::StoredEvent;
use eventide_event_bus::InMemoryEventBus;
use eventide_event_store::in_memory::InMemoryEventRepository;
use eventide_test_support::FixedClock;
use eventide_user::application::command_handlers::{
    UserRepository, handle_register_user, handle_verify_email,
};
use eventide_user::application::query_handlers::get_user_by_id;
use eventide_user::domain::commands::{RegisterUser, VerifyEmail};
use eventide_user::domain::events::{EMAIL_VERIFIED_EVENT_TYPE, USER_REGISTERED_EVENT_TYPE};
use uuid::Uuid;

/// Remembers the event types it was handed, in delivery order.
#[derive(Default)]
struct TypeLog {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl EventHandler for TypeLog {
    fn name(&self) -> &str {
        "type_log"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<(), DomainError> {
        self.seen.lock().unwrap().push(event.event_type.clone());
        Ok(())
    }
}

fn repository(log: &Arc<TypeLog>) -> UserRepository {
    let bus = Arc::new(InMemoryEventBus::new());
    bus.subscribe(USER_REGISTERED_EVENT_TYPE, log.clone());
    bus.subscribe(EMAIL_VERIFIED_EVENT_TYPE, log.clone());
    UserRepository::new(Arc::new(InMemoryEventRepository::new()), bus)
}

fn ctx() -> RequestContext {
    RequestContext::new(Uuid::new_v4())
}

#[tokio::test]
async fn test_register_verify_and_query() {
    // Arrange
    let clock = FixedClock::default_instant();
    let log = Arc::new(TypeLog::default());
    let repo = repository(&log);

    // Act
    let registered = handle_register_user(
        &RegisterUser {
            correlation_id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
        },
        &ctx(),
        &clock,
        &repo,
    )
    .await
    .unwrap();
    handle_verify_email(
        &VerifyEmail {
            correlation_id: Uuid::new_v4(),
            user_id: registered.aggregate_id,
        },
        &ctx(),
        &clock,
        &repo,
    )
    .await
    .unwrap();
    let view = get_user_by_id(&ctx(), registered.aggregate_id, &repo)
        .await
        .unwrap();

    // Assert
    assert_eq!(view.email.as_deref(), Some("ada@example.com"));
    assert!(view.email_verified);
    assert_eq!(view.version, 2);
    // Registration is acknowledged, so its handler has already run.
    assert_eq!(log.seen.lock().unwrap()[0], USER_REGISTERED_EVENT_TYPE);
}

#[tokio::test]
async fn test_stale_copy_is_rejected_by_the_store() {
    // Arrange
    let clock = FixedClock::default_instant();
    let log = Arc::new(TypeLog::default());
    let repo = repository(&log);
    let registered = handle_register_user(
        &RegisterUser {
            correlation_id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
        },
        &ctx(),
        &clock,
        &repo,
    )
    .await
    .unwrap();
    let user_id = registered.aggregate_id;
    let mut first = repo.get(&ctx(), user_id).await.unwrap();
    let mut second = repo.get(&ctx(), user_id).await.unwrap();

    // Act
    first.verify_email(Uuid::new_v4(), &clock).unwrap();
    repo.save(&ctx(), &mut first).await.unwrap();
    second
        .change_email_address("ada@lovelace.dev", Uuid::new_v4(), &clock)
        .unwrap();
    let result = repo.save(&ctx(), &mut second).await;

    // Assert
    let err = result.unwrap_err();
    match &err {
        DomainError::Store { operation, .. } => assert_eq!(*operation, "append"),
        other => panic!("expected Store, got {other:?}"),
    }
    assert!(matches!(
        err.root_cause(),
        DomainError::ConcurrencyConflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));
    let view = get_user_by_id(&ctx(), user_id, &repo).await.unwrap();
    assert_eq!(view.email.as_deref(), Some("ada@example.com"));
    assert_eq!(view.version, 2);
}
