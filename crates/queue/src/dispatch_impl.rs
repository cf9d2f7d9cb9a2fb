//! Redis-backed notification dispatch implementation.
//!
//! Queues notification jobs for the apalis worker to process, keeping
//! the request path free of SMTP latency.

use async_trait::async_trait;

use bullhorn_common::{AppError, AppResult};
use bullhorn_core::NotificationDispatch;

use crate::jobs::{NotifyJob, NotifyKind};

/// Redis-backed notification dispatch service.
#[derive(Clone)]
pub struct RedisDispatchService {
    /// Redis storage for job queue (apalis-redis).
    storage: apalis_redis::RedisStorage<NotifyJob>,
}

impl RedisDispatchService {
    /// Create a new Redis dispatch service.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<NotifyJob>) -> Self {
        Self { storage }
    }

    async fn queue(&self, kind: NotifyKind, entity_id: &str) -> AppResult<()> {
        use apalis::prelude::*;

        let job = NotifyJob::new(kind, entity_id.to_string());

        self.storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue job: {e}")))?;

        tracing::debug!(kind = ?kind, entity_id = %entity_id, "Queued notification job");

        Ok(())
    }
}

#[async_trait]
impl NotificationDispatch for RedisDispatchService {
    async fn queue_broadcast_email(&self, broadcast_id: &str) -> AppResult<()> {
        self.queue(NotifyKind::Broadcast, broadcast_id).await
    }

    async fn queue_event_email(&self, event_id: &str) -> AppResult<()> {
        self.queue(NotifyKind::Event, event_id).await
    }
}
