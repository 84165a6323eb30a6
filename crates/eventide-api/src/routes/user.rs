//! Routes for the User bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use eventide_core::command::Command;
use eventide_core::context::RequestContext;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use eventide_user::application::command_handlers::{self, UserCommandResult};
use eventide_user::application::query_handlers::{self, UserView};
use eventide_user::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /register.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    /// The email address to register with.
    pub email: String,
}

/// Request body for POST /verify-email.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    /// The user whose email is verified.
    pub user_id: Uuid,
}

/// Request body for POST /change-email-address.
#[derive(Debug, Deserialize)]
pub struct ChangeEmailAddressRequest {
    /// The user whose address changes.
    pub user_id: Uuid,
    /// The new email address.
    pub email: String,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate ID affected or created by the command.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<UserCommandResult> for CommandResponse {
    fn from(result: UserCommandResult) -> Self {
        Self {
            aggregate_id: result.aggregate_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

/// POST /register
#[instrument(skip_all)]
async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RegisterUser {
        correlation_id: Uuid::new_v4(),
        email: request.email,
    };
    let ctx = command.context(Some(state.request_timeout));

    info!(correlation_id = %command.correlation_id, "handling register_user command");

    let result =
        command_handlers::handle_register_user(&command, &ctx, state.clock.as_ref(), &state.users)
            .await?;

    Ok(Json(result.into()))
}

/// POST /verify-email
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::VerifyEmail {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
    };
    let ctx = command.context(Some(state.request_timeout));

    info!(correlation_id = %command.correlation_id, "handling verify_email command");

    let result =
        command_handlers::handle_verify_email(&command, &ctx, state.clock.as_ref(), &state.users)
            .await?;

    Ok(Json(result.into()))
}

/// POST /change-email-address
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn change_email_address(
    State(state): State<AppState>,
    Json(request): Json<ChangeEmailAddressRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ChangeEmailAddress {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        email: request.email,
    };
    let ctx = command.context(Some(state.request_timeout));

    info!(correlation_id = %command.correlation_id, "handling change_email_address command");

    let result = command_handlers::handle_change_email_address(
        &command,
        &ctx,
        state.clock.as_ref(),
        &state.users,
    )
    .await?;

    Ok(Json(result.into()))
}

/// GET /{user_id}
#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let ctx = RequestContext::new(Uuid::new_v4()).with_timeout(state.request_timeout);
    let view = query_handlers::get_user_by_id(&ctx, user_id, &state.users).await?;
    Ok(Json(view))
}

/// Returns the router for the user context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_user))
        .route("/verify-email", post(verify_email))
        .route("/change-email-address", post(change_email_address))
        .route("/{user_id}", get(get_user))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use eventide_core::bus::EventBus;
    use eventide_core::repository::EventRepository;
    use eventide_test_support::{
        FailingEventBus, FailingEventRepository, FixedClock, RecordingEventBus,
        RecordingEventRepository,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(
        event_repository: Arc<dyn EventRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> AppState {
        AppState::new(
            Arc::new(FixedClock::default_instant()),
            event_repository,
            event_bus,
            Duration::from_secs(5),
        )
    }

    fn test_app_state() -> AppState {
        app_state_with(
            Arc::new(RecordingEventRepository::new()),
            Arc::new(RecordingEventBus::new()),
        )
    }

    fn post(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_returns_200_with_aggregate_and_event_ids() {
        // Arrange
        let app = router().with_state(test_app_state());
        let body = serde_json::json!({ "email": "ada@example.com" });

        // Act
        let response = app.oneshot(post("/register", &body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        Uuid::parse_str(json["aggregate_id"].as_str().unwrap()).unwrap();
        let event_ids = json["event_ids"].as_array().unwrap();
        assert_eq!(event_ids.len(), 1);
        for id in event_ids {
            Uuid::parse_str(id.as_str().unwrap()).unwrap();
        }
    }

    #[tokio::test]
    async fn test_register_returns_400_for_invalid_email() {
        let app = router().with_state(test_app_state());
        let body = serde_json::json!({ "email": "not-an-email" });

        let response = app.oneshot(post("/register", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_returns_422_for_missing_body_fields() {
        let app = router().with_state(test_app_state());

        let response = app
            .oneshot(post("/register", &serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_register_returns_500_when_store_fails() {
        // Arrange
        let app = router().with_state(app_state_with(
            Arc::new(FailingEventRepository::default()),
            Arc::new(RecordingEventBus::new()),
        ));
        let body = serde_json::json!({ "email": "ada@example.com" });

        // Act
        let response = app.oneshot(post("/register", &body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "store_error");
    }

    #[tokio::test]
    async fn test_register_returns_500_when_publish_fails() {
        let app = router().with_state(app_state_with(
            Arc::new(RecordingEventRepository::new()),
            Arc::new(FailingEventBus),
        ));
        let body = serde_json::json!({ "email": "ada@example.com" });

        let response = app.oneshot(post("/register", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "publish_error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_returns_504_when_acknowledgement_outlives_deadline() {
        // Arrange
        let mut state = app_state_with(
            Arc::new(RecordingEventRepository::new()),
            Arc::new(RecordingEventBus::new().with_ack_delay(Duration::from_secs(30))),
        );
        state.request_timeout = Duration::from_secs(1);
        let app = router().with_state(state);
        let body = serde_json::json!({ "email": "ada@example.com" });

        // Act
        let response = app.oneshot(post("/register", &body)).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let json = json_body(response).await;
        assert_eq!(json["error"], "deadline_exceeded");
    }

    #[tokio::test]
    async fn test_verify_email_returns_404_for_unknown_user() {
        let app = router().with_state(test_app_state());
        let body = serde_json::json!({ "user_id": Uuid::new_v4() });

        let response = app.oneshot(post("/verify-email", &body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_register_then_change_email_then_get() {
        // Arrange
        let state = test_app_state();
        let response = router()
            .with_state(state.clone())
            .oneshot(post(
                "/register",
                &serde_json::json!({ "email": "ada@example.com" }),
            ))
            .await
            .unwrap();
        let user_id = json_body(response).await["aggregate_id"]
            .as_str()
            .unwrap()
            .to_owned();

        // Act
        let response = router()
            .with_state(state.clone())
            .oneshot(post(
                "/change-email-address",
                &serde_json::json!({ "user_id": user_id, "email": "ada@lovelace.dev" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder()
            .method("GET")
            .uri(format!("/{user_id}"))
            .body(Body::empty())
            .unwrap();
        let response = router().with_state(state).oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["user_id"], user_id);
        assert_eq!(json["email"], "ada@lovelace.dev");
        assert_eq!(json["email_verified"], false);
        assert_eq!(json["version"], 2);
    }

    #[tokio::test]
    async fn test_get_user_returns_400_for_malformed_id() {
        let app = router().with_state(test_app_state());
        let request = Request::builder()
            .method("GET")
            .uri("/not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
