//! Command abstractions.

use std::time::Duration;

use uuid::Uuid;

use crate::context::RequestContext;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// Builds the context the command's repository calls run under.
    fn context(&self, timeout: Option<Duration>) -> RequestContext {
        let ctx = RequestContext::new(self.correlation_id());
        match timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}
