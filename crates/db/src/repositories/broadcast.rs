//! Broadcast repository.

use std::sync::Arc;

use bullhorn_common::{AppError, AppResult, IdGenerator};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entities::{
    Broadcast, BroadcastAcknowledgment, BroadcastAttachment, BroadcastTargetGroup,
    BroadcastTargetUser, BroadcastView, broadcast, broadcast_acknowledgment,
    broadcast_attachment, broadcast_target_group, broadcast_target_user, broadcast_view,
};

/// Parameters for creating a broadcast.
#[derive(Debug, Clone)]
pub struct NewBroadcast {
    pub id: String,
    pub title: String,
    pub body: String,
    pub priority: broadcast::BroadcastPriority,
    pub audience: broadcast::BroadcastAudience,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub send_email: bool,
    pub is_published: bool,
    pub created_by: String,
    pub target_group_ids: Vec<String>,
    pub target_user_ids: Vec<String>,
    pub attachment_media_ids: Vec<String>,
}

/// List filters for broadcasts.
#[derive(Debug, Clone, Default)]
pub struct BroadcastFilter {
    pub priority: Option<broadcast::BroadcastPriority>,
    pub audience: Option<broadcast::BroadcastAudience>,
    pub is_published: Option<bool>,
    /// Case-insensitive substring match on title or body.
    pub search: Option<String>,
}

/// Repository for broadcast operations.
#[derive(Clone)]
pub struct BroadcastRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl BroadcastRepository {
    /// Create a new broadcast repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db, id_gen: IdGenerator::new() }
    }

    /// Create a broadcast together with its target and attachment rows.
    pub async fn create(&self, new: NewBroadcast) -> AppResult<broadcast::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let active_model = broadcast::ActiveModel {
            id: Set(new.id.clone()),
            title: Set(new.title),
            body: Set(new.body),
            priority: Set(new.priority),
            audience: Set(new.audience),
            starts_at: Set(new.starts_at.into()),
            ends_at: Set(new.ends_at.into()),
            send_email: Set(new.send_email),
            is_published: Set(new.is_published),
            is_active: Set(true),
            created_by: Set(new.created_by),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let model = active_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for group_id in new.target_group_ids {
            broadcast_target_group::ActiveModel {
                id: Set(self.id_gen.generate()),
                broadcast_id: Set(new.id.clone()),
                group_id: Set(group_id),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for user_id in new.target_user_ids {
            broadcast_target_user::ActiveModel {
                id: Set(self.id_gen.generate()),
                broadcast_id: Set(new.id.clone()),
                user_id: Set(user_id),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for media_id in new.attachment_media_ids {
            broadcast_attachment::ActiveModel {
                id: Set(self.id_gen.generate()),
                broadcast_id: Set(new.id.clone()),
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

    /// Find broadcast by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<broadcast::Model>> {
        Broadcast::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active broadcasts with filters, newest first.
    pub async fn find_all(
        &self,
        filter: &BroadcastFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<broadcast::Model>> {
        let mut query = Broadcast::find().filter(broadcast::Column::IsActive.eq(true));

        if let Some(priority) = filter.priority {
            query = query.filter(broadcast::Column::Priority.eq(priority));
        }
        if let Some(audience) = filter.audience {
            query = query.filter(broadcast::Column::Audience.eq(audience));
        }
        if let Some(is_published) = filter.is_published {
            query = query.filter(broadcast::Column::IsPublished.eq(is_published));
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            query = query.filter(
                Condition::any()
                    .add(broadcast::Column::Title.like(pattern.clone()))
                    .add(broadcast::Column::Body.like(pattern)),
            );
        }

        query
            .order_by(broadcast::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active broadcasts created by a user, newest first.
    pub async fn find_by_creator(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<broadcast::Model>> {
        Broadcast::find()
            .filter(broadcast::Column::IsActive.eq(true))
            .filter(broadcast::Column::CreatedBy.eq(user_id))
            .order_by(broadcast::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a broadcast.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: &str,
        title: Option<String>,
        body: Option<String>,
        priority: Option<broadcast::BroadcastPriority>,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
        send_email: Option<bool>,
        is_published: Option<bool>,
    ) -> AppResult<broadcast::Model> {
        let existing = Broadcast::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::BroadcastNotFound(id.to_string()))?;

        let mut active: broadcast::ActiveModel = existing.into();

        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(body) = body {
            active.body = Set(body);
        }
        if let Some(priority) = priority {
            active.priority = Set(priority);
        }
        if let Some(starts_at) = starts_at {
            active.starts_at = Set(starts_at.into());
        }
        if let Some(ends_at) = ends_at {
            active.ends_at = Set(ends_at.into());
        }
        if let Some(send_email) = send_email {
            active.send_email = Set(send_email);
        }
        if let Some(is_published) = is_published {
            active.is_published = Set(is_published);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete a broadcast. View logs stay in place.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        let existing = Broadcast::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::BroadcastNotFound(id.to_string()))?;

        let mut active: broadcast::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // === Targeting ===

    /// Group IDs a broadcast targets.
    pub async fn target_group_ids(&self, broadcast_id: &str) -> AppResult<Vec<String>> {
        BroadcastTargetGroup::find()
            .select_only()
            .column(broadcast_target_group::Column::GroupId)
            .filter(broadcast_target_group::Column::BroadcastId.eq(broadcast_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// User IDs a broadcast targets directly.
    pub async fn target_user_ids(&self, broadcast_id: &str) -> AppResult<Vec<String>> {
        BroadcastTargetUser::find()
            .select_only()
            .column(broadcast_target_user::Column::UserId)
            .filter(broadcast_target_user::Column::BroadcastId.eq(broadcast_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Target group rows for a set of broadcasts (list filtering).
    pub async fn target_groups_for_many(
        &self,
        broadcast_ids: &[String],
    ) -> AppResult<Vec<broadcast_target_group::Model>> {
        if broadcast_ids.is_empty() {
            return Ok(Vec::new());
        }

        BroadcastTargetGroup::find()
            .filter(broadcast_target_group::Column::BroadcastId.is_in(broadcast_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Target user rows for a set of broadcasts (list filtering).
    pub async fn target_users_for_many(
        &self,
        broadcast_ids: &[String],
    ) -> AppResult<Vec<broadcast_target_user::Model>> {
        if broadcast_ids.is_empty() {
            return Ok(Vec::new());
        }

        BroadcastTargetUser::find()
            .filter(broadcast_target_user::Column::BroadcastId.is_in(broadcast_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Media IDs attached to a broadcast.
    pub async fn attachment_media_ids(&self, broadcast_id: &str) -> AppResult<Vec<String>> {
        BroadcastAttachment::find()
            .select_only()
            .column(broadcast_attachment::Column::MediaId)
            .filter(broadcast_attachment::Column::BroadcastId.eq(broadcast_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Acknowledgments ===

    /// Record an acknowledgment. Returns false if the user had
    /// already acknowledged.
    pub async fn acknowledge(&self, broadcast_id: &str, user_id: &str) -> AppResult<bool> {
        let active_model = broadcast_acknowledgment::ActiveModel {
            id: Set(self.id_gen.generate()),
            broadcast_id: Set(broadcast_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let result = BroadcastAcknowledgment::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    broadcast_acknowledgment::Column::BroadcastId,
                    broadcast_acknowledgment::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Withdraw an acknowledgment. Idempotent; leaves no trace.
    pub async fn withdraw_acknowledgment(
        &self,
        broadcast_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        BroadcastAcknowledgment::delete_many()
            .filter(broadcast_acknowledgment::Column::BroadcastId.eq(broadcast_id))
            .filter(broadcast_acknowledgment::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Check whether a user has acknowledged a broadcast.
    pub async fn has_acknowledged(&self, broadcast_id: &str, user_id: &str) -> AppResult<bool> {
        let row = BroadcastAcknowledgment::find()
            .filter(broadcast_acknowledgment::Column::BroadcastId.eq(broadcast_id))
            .filter(broadcast_acknowledgment::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Acknowledgment count for a broadcast.
    pub async fn count_acknowledgments(&self, broadcast_id: &str) -> AppResult<u64> {
        BroadcastAcknowledgment::find()
            .filter(broadcast_acknowledgment::Column::BroadcastId.eq(broadcast_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Views ===

    /// Record a view. The unique (broadcast, user) index makes repeat
    /// calls no-ops; returns false when the row already existed.
    pub async fn record_view(
        &self,
        broadcast_id: &str,
        user_id: &str,
        ip_address: Option<String>,
    ) -> AppResult<bool> {
        let active_model = broadcast_view::ActiveModel {
            id: Set(self.id_gen.generate()),
            broadcast_id: Set(broadcast_id.to_string()),
            user_id: Set(user_id.to_string()),
            ip_address: Set(ip_address),
            viewed_at: Set(Utc::now().into()),
        };

        let result = BroadcastView::insert(active_model)
            .on_conflict(
                OnConflict::columns([
                    broadcast_view::Column::BroadcastId,
                    broadcast_view::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(self.db.as_ref())
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Check whether a user has viewed a broadcast.
    pub async fn has_viewed(&self, broadcast_id: &str, user_id: &str) -> AppResult<bool> {
        let row = BroadcastView::find()
            .filter(broadcast_view::Column::BroadcastId.eq(broadcast_id))
            .filter(broadcast_view::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// View count for a broadcast.
    pub async fn count_views(&self, broadcast_id: &str) -> AppResult<u64> {
        BroadcastView::find()
            .filter(broadcast_view::Column::BroadcastId.eq(broadcast_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// View rows on or after the given time (daily bucketing).
    pub async fn views_since(
        &self,
        broadcast_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<broadcast_view::Model>> {
        BroadcastView::find()
            .filter(broadcast_view::Column::BroadcastId.eq(broadcast_id))
            .filter(broadcast_view::Column::ViewedAt.gte(since))
            .order_by(broadcast_view::Column::ViewedAt, Order::Asc)
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

    fn create_test_broadcast(id: &str, audience: broadcast::BroadcastAudience) -> broadcast::Model {
        let now = Utc::now();
        broadcast::Model {
            id: id.to_string(),
            title: format!("Broadcast {id}"),
            body: "Body text".to_string(),
            priority: broadcast::BroadcastPriority::Normal,
            audience,
            starts_at: (now - Duration::hours(1)).into(),
            ends_at: (now + Duration::hours(1)).into(),
            send_email: false,
            is_published: true,
            is_active: true,
            created_by: "u1".to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_broadcast() {
        let broadcast = create_test_broadcast("b1", broadcast::BroadcastAudience::All);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[broadcast]])
                .into_connection(),
        );

        let repo = BroadcastRepository::new(db);
        let found = repo.find_by_id("b1").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().audience, broadcast::BroadcastAudience::All);
    }

    #[tokio::test]
    async fn test_has_acknowledged_false_without_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<broadcast_acknowledgment::Model>::new()])
                .into_connection(),
        );

        let repo = BroadcastRepository::new(db);
        let acked = repo.has_acknowledged("b1", "u1").await.unwrap();

        assert!(!acked);
    }

    #[tokio::test]
    async fn test_count_views() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .into_connection(),
        );

        let repo = BroadcastRepository::new(db);
        let count = repo.count_views("b1").await.unwrap();

        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_withdraw_acknowledgment_idempotent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = BroadcastRepository::new(db);
        let result = repo.withdraw_acknowledgment("b1", "u1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_target_groups_for_many_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = BroadcastRepository::new(db);
        let rows = repo.target_groups_for_many(&[]).await.unwrap();

        assert!(rows.is_empty());
    }
}
