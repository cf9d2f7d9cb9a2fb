//! Notification dispatch abstraction.
//!
//! Core services queue email notifications without depending on the
//! queue implementation; the queue crate provides the Redis-backed
//! one.

use async_trait::async_trait;
use bullhorn_common::AppResult;

/// Trait for queueing notification emails.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    /// Queue notification emails for a broadcast's recipients.
    async fn queue_broadcast_email(&self, broadcast_id: &str) -> AppResult<()>;

    /// Queue notification emails for an event's visible users.
    async fn queue_event_email(&self, event_id: &str) -> AppResult<()>;
}

/// No-op dispatch used in tests and when email is disabled.
pub struct NoOpDispatch;

#[async_trait]
impl NotificationDispatch for NoOpDispatch {
    async fn queue_broadcast_email(&self, _broadcast_id: &str) -> AppResult<()> {
        Ok(())
    }

    async fn queue_event_email(&self, _event_id: &str) -> AppResult<()> {
        Ok(())
    }
}
