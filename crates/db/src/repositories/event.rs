//! Event repository.

use std::sync::Arc;

use bullhorn_common::{AppError, AppResult, IdGenerator};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{
    Event, EventMedia, EventRsvp, EventRsvpLog, EventVisibleGroup, EventVisibleUser, event,
    event_media, event_rsvp, event_rsvp_log, event_visible_group, event_visible_user,
};

/// Parameters for creating an event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: String,
    pub title: String,
    pub body: String,
    pub event_type: event::EventType,
    pub starts_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub theme: Option<serde_json::Value>,
    pub is_important: bool,
    pub is_public: bool,
    pub created_by: String,
    pub visible_group_ids: Vec<String>,
    pub visible_user_ids: Vec<String>,
    pub media_ids: Vec<String>,
}

/// List filters for events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<event::EventType>,
    pub is_public: Option<bool>,
    /// Only events with `starts_at` in the future.
    pub upcoming: bool,
    /// Case-insensitive substring match on title or body.
    pub search: Option<String>,
}

/// Repository for event and RSVP operations.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db, id_gen: IdGenerator::new() }
    }

    /// Create an event together with its visibility and media rows.
    pub async fn create(&self, new: NewEvent) -> AppResult<event::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let active_model = event::ActiveModel {
            id: Set(new.id.clone()),
            title: Set(new.title),
            body: Set(new.body),
            event_type: Set(new.event_type),
            starts_at: Set(new.starts_at.into()),
            venue: Set(new.venue),
            theme: Set(new.theme),
            is_important: Set(new.is_important),
            is_public: Set(new.is_public),
            is_active: Set(true),
            created_by: Set(new.created_by),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let model = active_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for group_id in new.visible_group_ids {
            event_visible_group::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(new.id.clone()),
                group_id: Set(group_id),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for user_id in new.visible_user_ids {
            event_visible_user::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(new.id.clone()),
                user_id: Set(user_id),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for media_id in new.media_ids {
            event_media::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(new.id.clone()),
                media_id: Set(media_id),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(model)
    }

    /// Find event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active events with filters, soonest first.
    pub async fn find_all(
        &self,
        filter: &EventFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        let mut query = Event::find().filter(event::Column::IsActive.eq(true));

        if let Some(event_type) = filter.event_type {
            query = query.filter(event::Column::EventType.eq(event_type));
        }
        if let Some(is_public) = filter.is_public {
            query = query.filter(event::Column::IsPublic.eq(is_public));
        }
        if filter.upcoming {
            query = query.filter(event::Column::StartsAt.gt(Utc::now()));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                sea_orm::Condition::any()
                    .add(event::Column::Title.like(pattern.clone()))
                    .add(event::Column::Body.like(pattern)),
            );
        }

        query
            .order_by(event::Column::StartsAt, Order::Asc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active events created by a user, newest first.
    pub async fn find_by_creator(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        Event::find()
            .filter(event::Column::IsActive.eq(true))
            .filter(event::Column::CreatedBy.eq(user_id))
            .order_by(event::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an event.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: &str,
        title: Option<String>,
        body: Option<String>,
        event_type: Option<event::EventType>,
        starts_at: Option<DateTime<Utc>>,
        venue: Option<Option<String>>,
        theme: Option<Option<serde_json::Value>>,
        is_important: Option<bool>,
        is_public: Option<bool>,
    ) -> AppResult<event::Model> {
        let existing = Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))?;

        let mut active: event::ActiveModel = existing.into();

        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(body) = body {
            active.body = Set(body);
        }
        if let Some(event_type) = event_type {
            active.event_type = Set(event_type);
        }
        if let Some(starts_at) = starts_at {
            active.starts_at = Set(starts_at.into());
        }
        if let Some(venue) = venue {
            active.venue = Set(venue);
        }
        if let Some(theme) = theme {
            active.theme = Set(theme);
        }
        if let Some(is_important) = is_important {
            active.is_important = Set(is_important);
        }
        if let Some(is_public) = is_public {
            active.is_public = Set(is_public);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete an event.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        let existing = Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))?;

        let mut active: event::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // === Visibility ===

    /// Group IDs an event is visible to.
    pub async fn visible_group_ids(&self, event_id: &str) -> AppResult<Vec<String>> {
        EventVisibleGroup::find()
            .select_only()
            .column(event_visible_group::Column::GroupId)
            .filter(event_visible_group::Column::EventId.eq(event_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// User IDs an event is visible to directly.
    pub async fn visible_user_ids(&self, event_id: &str) -> AppResult<Vec<String>> {
        EventVisibleUser::find()
            .select_only()
            .column(event_visible_user::Column::UserId)
            .filter(event_visible_user::Column::EventId.eq(event_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible group rows for a set of events (list filtering).
    pub async fn visible_groups_for_many(
        &self,
        event_ids: &[String],
    ) -> AppResult<Vec<event_visible_group::Model>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        EventVisibleGroup::find()
            .filter(event_visible_group::Column::EventId.is_in(event_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Visible user rows for a set of events (list filtering).
    pub async fn visible_users_for_many(
        &self,
        event_ids: &[String],
    ) -> AppResult<Vec<event_visible_user::Model>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        EventVisibleUser::find()
            .filter(event_visible_user::Column::EventId.is_in(event_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Media IDs attached to an event.
    pub async fn media_ids(&self, event_id: &str) -> AppResult<Vec<String>> {
        EventMedia::find()
            .select_only()
            .column(event_media::Column::MediaId)
            .filter(event_media::Column::EventId.eq(event_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === RSVP ===

    /// Current RSVP of a user for an event.
    pub async fn find_rsvp(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> AppResult<Option<event_rsvp::Model>> {
        EventRsvp::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set a user's RSVP for an event, recording the transition.
    ///
    /// Runs in a transaction: the status row is upserted and one log
    /// row (old-or-null to new) is appended. The unique
    /// (event, user) index keeps the status exclusive.
    pub async fn set_rsvp(
        &self,
        event_id: &str,
        user_id: &str,
        status: event_rsvp::RsvpStatus,
    ) -> AppResult<(Option<event_rsvp::RsvpStatus>, event_rsvp::Model)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let existing = EventRsvp::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let old_status = existing.as_ref().map(|r| r.status);
        let now = Utc::now();

        let rsvp = if let Some(existing) = existing {
            let mut active: event_rsvp::ActiveModel = existing.into();
            active.status = Set(status);
            active.responded_at = Set(now.into());
            active
                .update(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
        } else {
            event_rsvp::ActiveModel {
                id: Set(self.id_gen.generate()),
                event_id: Set(event_id.to_string()),
                user_id: Set(user_id.to_string()),
                status: Set(status),
                responded_at: Set(now.into()),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        };

        event_rsvp_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            event_id: Set(event_id.to_string()),
            user_id: Set(user_id.to_string()),
            old_status: Set(old_status),
            new_status: Set(status),
            changed_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((old_status, rsvp))
    }

    /// All RSVP rows for an event.
    pub async fn rsvps_for_event(&self, event_id: &str) -> AppResult<Vec<event_rsvp::Model>> {
        EventRsvp::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .order_by(event_rsvp::Column::RespondedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// RSVP count for one status.
    pub async fn count_rsvps(
        &self,
        event_id: &str,
        status: event_rsvp::RsvpStatus,
    ) -> AppResult<u64> {
        EventRsvp::find()
            .filter(event_rsvp::Column::EventId.eq(event_id))
            .filter(event_rsvp::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// RSVP log rows on or after the given time (daily bucketing).
    pub async fn rsvp_logs_since(
        &self,
        event_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<event_rsvp_log::Model>> {
        EventRsvpLog::find()
            .filter(event_rsvp_log::Column::EventId.eq(event_id))
            .filter(event_rsvp_log::Column::ChangedAt.gte(since))
            .order_by(event_rsvp_log::Column::ChangedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_event(id: &str, is_public: bool) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: id.to_string(),
            title: format!("Event {id}"),
            body: "Details".to_string(),
            event_type: event::EventType::Internal,
            starts_at: (now + Duration::days(1)).into(),
            venue: None,
            theme: None,
            is_important: false,
            is_public,
            is_active: true,
            created_by: "u1".to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn create_test_rsvp(event_id: &str, user_id: &str, status: event_rsvp::RsvpStatus) -> event_rsvp::Model {
        event_rsvp::Model {
            id: format!("rsvp_{event_id}_{user_id}"),
            event_id: event_id.to_string(),
            user_id: user_id.to_string(),
            status,
            responded_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_event() {
        let event = create_test_event("e1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[event]])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let found = repo.find_by_id("e1").await.unwrap();

        assert!(found.is_some());
        assert!(found.unwrap().is_public);
    }

    #[tokio::test]
    async fn test_find_rsvp_none_without_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<event_rsvp::Model>::new()])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let rsvp = repo.find_rsvp("e1", "u1").await.unwrap();

        assert!(rsvp.is_none());
    }

    #[tokio::test]
    async fn test_set_rsvp_first_response_has_no_old_status() {
        let inserted = create_test_rsvp("e1", "u1", event_rsvp::RsvpStatus::Yes);
        let log = event_rsvp_log::Model {
            id: "log1".to_string(),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            old_status: None,
            new_status: event_rsvp::RsvpStatus::Yes,
            changed_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // lookup inside the transaction finds nothing
                .append_query_results([Vec::<event_rsvp::Model>::new()])
                // insert rsvp, then insert log
                .append_query_results([[inserted]])
                .append_query_results([[log]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let (old, new) = repo
            .set_rsvp("e1", "u1", event_rsvp::RsvpStatus::Yes)
            .await
            .unwrap();

        assert!(old.is_none());
        assert_eq!(new.status, event_rsvp::RsvpStatus::Yes);
    }

    #[tokio::test]
    async fn test_set_rsvp_change_reports_old_status() {
        let existing = create_test_rsvp("e1", "u1", event_rsvp::RsvpStatus::Yes);
        let updated = create_test_rsvp("e1", "u1", event_rsvp::RsvpStatus::Maybe);
        let log = event_rsvp_log::Model {
            id: "log2".to_string(),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            old_status: Some(event_rsvp::RsvpStatus::Yes),
            new_status: event_rsvp::RsvpStatus::Maybe,
            changed_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_query_results([[updated]])
                .append_query_results([[log]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
                .into_connection(),
        );

        let repo = EventRepository::new(db);
        let (old, new) = repo
            .set_rsvp("e1", "u1", event_rsvp::RsvpStatus::Maybe)
            .await
            .unwrap();

        assert_eq!(old, Some(event_rsvp::RsvpStatus::Yes));
        assert_eq!(new.status, event_rsvp::RsvpStatus::Maybe);
    }

}
