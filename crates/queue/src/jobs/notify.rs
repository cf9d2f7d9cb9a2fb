//! Notification email job.

use serde::{Deserialize, Serialize};

/// What kind of entity a notification job fans out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotifyKind {
    /// A published broadcast with `send_email` set.
    Broadcast,
    /// A newly created event.
    Event,
}

/// Job to send notification emails for a broadcast or event.
///
/// The job carries only the entity ID; the worker resolves the
/// recipient list at processing time so late membership changes are
/// picked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyJob {
    /// Entity kind.
    pub kind: NotifyKind,

    /// Broadcast or event ID.
    pub entity_id: String,
}

impl NotifyJob {
    /// Create a new notify job.
    #[must_use]
    pub const fn new(kind: NotifyKind, entity_id: String) -> Self {
        Self { kind, entity_id }
    }
}
