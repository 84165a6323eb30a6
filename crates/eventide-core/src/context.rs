//! Per-request context: time source and cancellation deadline.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::DomainError;

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Context a repository call runs under.
///
/// Every store and bus call made on behalf of the request goes through
/// [`RequestContext::run`], so a deadline bounds the whole operation.
/// Dropping the future that owns the context cancels whatever call is in
/// flight.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    correlation_id: Uuid,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context without a deadline.
    #[must_use]
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            deadline: None,
        }
    }

    /// Sets the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Correlation ID of the request.
    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// The deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has already passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Runs one collaborator call under this context.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DeadlineExceeded` if the deadline passed before
    /// or during the call; otherwise the call's own result.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        if self.is_expired() {
            return Err(DomainError::DeadlineExceeded { operation });
        }
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| DomainError::DeadlineExceeded { operation })?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_without_deadline_returns_call_result() {
        // Arrange
        let ctx = RequestContext::new(Uuid::new_v4());

        // Act
        let result = ctx.run("load", async { Ok::<_, DomainError>(7) }).await;

        // Assert
        assert_eq!(result.unwrap(), 7);
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_call_that_outlives_deadline() {
        // Arrange
        let ctx = RequestContext::new(Uuid::new_v4()).with_timeout(Duration::from_millis(50));

        // Act
        let result = ctx
            .run("publish_and_acknowledge", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, DomainError>(())
            })
            .await;

        // Assert
        match result.unwrap_err() {
            DomainError::DeadlineExceeded { operation } => {
                assert_eq!(operation, "publish_and_acknowledge");
            }
            other => panic!("expected DeadlineExceeded, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fails_fast_once_expired() {
        // Arrange
        let ctx = RequestContext::new(Uuid::new_v4()).with_timeout(Duration::from_millis(10));
        tokio::time::advance(Duration::from_millis(20)).await;
        let mut called = false;

        // Act
        let result = ctx
            .run("append", async {
                called = true;
                Ok::<_, DomainError>(())
            })
            .await;

        // Assert
        assert!(ctx.is_expired());
        assert!(matches!(
            result,
            Err(DomainError::DeadlineExceeded { operation: "append" })
        ));
        assert!(!called);
    }
}
