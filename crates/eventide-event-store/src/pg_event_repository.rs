//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use eventide_core::error::DomainError;
use eventide_core::repository::{EventRepository, StoredEvent};

use crate::schema;

/// PostgreSQL-backed event repository.
///
/// Each append runs in one transaction holding an advisory lock on the
/// `(stream_name, aggregate_id)` pair, so the version check and the inserts
/// see no interleaved writer.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    stream_name: String,
    aggregate_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    sequence_number: i64,
    correlation_id: Uuid,
    causation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_id: row.aggregate_id,
            stream_name: row.stream_name,
            event_type: row.event_type,
            payload: row.payload,
            sequence_number: row.sequence_number,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            occurred_at: row.occurred_at,
        }
    }
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(format!("database error: {err}"))
}

/// Maps an insert failure, reporting a duplicate `(stream, id, sequence)` key
/// as a concurrency conflict on the colliding sequence number.
fn insert_error(
    err: sqlx::Error,
    aggregate_id: Uuid,
    expected_version: i64,
    sequence_number: i64,
) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: sequence_number,
            }
        }
        _ => infrastructure(err),
    }
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `domain_events` table and indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::raw_sql(schema::CREATE_EVENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip(self))]
    async fn load_events(
        &self,
        aggregate_id: Uuid,
        stream_name: &str,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r"
            SELECT event_id, stream_name, aggregate_id, event_type, payload,
                   sequence_number, correlation_id, causation_id, occurred_at
            FROM domain_events
            WHERE stream_name = $1 AND aggregate_id = $2
            ORDER BY sequence_number ASC
            ",
        )
        .bind(stream_name)
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        debug!(event_count = rows.len(), "loaded stream");
        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    #[instrument(skip(self, events), fields(event_count = events.len()))]
    async fn append_events(
        &self,
        stream_name: &str,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{stream_name}:{aggregate_id}"))
            .execute(&mut *tx)
            .await
            .map_err(infrastructure)?;

        let actual: i64 = sqlx::query_scalar(
            r"
            SELECT COALESCE(MAX(sequence_number), 0)
            FROM domain_events
            WHERE stream_name = $1 AND aggregate_id = $2
            ",
        )
        .bind(stream_name)
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;

        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            sqlx::query(
                r"
                INSERT INTO domain_events (
                    event_id, stream_name, aggregate_id, event_type, payload,
                    sequence_number, correlation_id, causation_id, occurred_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(event.event_id)
            .bind(stream_name)
            .bind(aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.sequence_number)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                insert_error(err, aggregate_id, expected_version, event.sequence_number)
            })?;
        }

        tx.commit().await.map_err(infrastructure)?;
        debug!("appended batch");
        Ok(())
    }
}
