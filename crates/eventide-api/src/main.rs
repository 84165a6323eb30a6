//! Eventide API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use eventide_api::config::AppConfig;
use eventide_api::error::AppError;
use eventide_api::routes;
use eventide_api::state::AppState;
use eventide_api::subscribers;
use eventide_core::context::SystemClock;
use eventide_core::repository::EventRepository;
use eventide_event_bus::InMemoryEventBus;
use eventide_event_store::in_memory::InMemoryEventRepository;
use eventide_event_store::pg_event_repository::PgEventRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Eventide API server");

    let config = AppConfig::from_env()?;

    let (event_repository, event_store) = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;
            let repository = PgEventRepository::new(pool);
            repository.ensure_schema().await?;
            let repository: Arc<dyn EventRepository> = Arc::new(repository);
            (repository, "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, events are kept in memory");
            let repository: Arc<dyn EventRepository> =
                Arc::new(InMemoryEventRepository::new());
            (repository, "in-memory")
        }
    };

    let event_bus = Arc::new(InMemoryEventBus::new());
    subscribers::register_default_subscribers(&event_bus);

    let app_state = AppState::new(
        Arc::new(SystemClock),
        event_repository,
        event_bus.clone(),
        config.request_timeout,
    )
    .with_event_store_name(event_store);

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    tracing::info!(%addr, event_store, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    event_bus.close();
    tracing::info!("Eventide API server stopped");

    Ok(())
}
