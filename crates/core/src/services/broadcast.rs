//! Broadcast service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use bullhorn_common::{AppError, AppResult, IdGenerator};
use bullhorn_db::entities::{broadcast, user};
use bullhorn_db::repositories::{
    BroadcastFilter, BroadcastRepository, GroupRepository, NewBroadcast, UserRepository,
};

use super::analytics::{self, BroadcastAnalytics};
use super::audience::{self, Membership};
use super::notify::NotificationDispatch;

/// Input for creating a broadcast.
#[derive(Debug, Clone)]
pub struct CreateBroadcast {
    pub title: String,
    pub body: String,
    pub priority: broadcast::BroadcastPriority,
    pub audience: broadcast::BroadcastAudience,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub send_email: bool,
    pub is_published: bool,
    pub target_group_ids: Vec<String>,
    pub target_user_ids: Vec<String>,
    pub attachment_media_ids: Vec<String>,
}

/// Input for updating a broadcast. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateBroadcast {
    pub title: Option<String>,
    pub body: Option<String>,
    pub priority: Option<broadcast::BroadcastPriority>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub send_email: Option<bool>,
    pub is_published: Option<bool>,
}

/// Service for broadcast operations.
#[derive(Clone)]
pub struct BroadcastService {
    broadcast_repo: BroadcastRepository,
    group_repo: GroupRepository,
    user_repo: UserRepository,
    notify: Arc<dyn NotificationDispatch>,
    id_gen: IdGenerator,
}

impl BroadcastService {
    /// Create a new broadcast service.
    #[must_use]
    pub fn new(
        broadcast_repo: BroadcastRepository,
        group_repo: GroupRepository,
        user_repo: UserRepository,
        notify: Arc<dyn NotificationDispatch>,
    ) -> Self {
        Self {
            broadcast_repo,
            group_repo,
            user_repo,
            notify,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a broadcast. Emails are queued when the broadcast is
    /// published with `send_email` set; a queue failure never fails
    /// the request.
    pub async fn create(
        &self,
        creator: &user::Model,
        input: CreateBroadcast,
    ) -> AppResult<broadcast::Model> {
        if input.starts_at >= input.ends_at {
            return Err(AppError::Validation(
                "starts_at must be before ends_at".to_string(),
            ));
        }

        let model = self
            .broadcast_repo
            .create(NewBroadcast {
                id: self.id_gen.generate(),
                title: input.title,
                body: input.body,
                priority: input.priority,
                audience: input.audience,
                starts_at: input.starts_at,
                ends_at: input.ends_at,
                send_email: input.send_email,
                is_published: input.is_published,
                created_by: creator.id.clone(),
                target_group_ids: input.target_group_ids,
                target_user_ids: input.target_user_ids,
                attachment_media_ids: input.attachment_media_ids,
            })
            .await?;

        if model.send_email && model.is_published {
            if let Err(e) = self.notify.queue_broadcast_email(&model.id).await {
                warn!(broadcast_id = %model.id, error = %e, "Failed to queue broadcast emails");
            }
        }

        Ok(model)
    }

    /// Get a broadcast the viewer is allowed to see.
    ///
    /// Hidden and missing broadcasts are indistinguishable to the
    /// caller.
    pub async fn get(&self, viewer: &user::Model, id: &str) -> AppResult<broadcast::Model> {
        let (model, _) = self.load_visible(viewer, id).await?;
        Ok(model)
    }

    /// List broadcasts the viewer can see. Staff see everything that
    /// matches the filter.
    pub async fn list(
        &self,
        viewer: &user::Model,
        filter: &BroadcastFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<broadcast::Model>> {
        let rows = self.broadcast_repo.find_all(filter, limit, offset).await?;

        if viewer.is_staff {
            return Ok(rows);
        }

        let viewer_group_ids: std::collections::HashSet<String> = self
            .group_repo
            .group_ids_for_user(&viewer.id)
            .await?
            .into_iter()
            .collect();

        let ids: Vec<String> = rows.iter().map(|b| b.id.clone()).collect();
        let target_groups = self.broadcast_repo.target_groups_for_many(&ids).await?;
        let target_users = self.broadcast_repo.target_users_for_many(&ids).await?;

        let now = Utc::now();
        let visible = rows
            .into_iter()
            .filter(|b| {
                let membership = Membership {
                    viewer_group_ids: viewer_group_ids.clone(),
                    target_group_ids: target_groups
                        .iter()
                        .filter(|t| t.broadcast_id == b.id)
                        .map(|t| t.group_id.clone())
                        .collect(),
                    target_user_ids: target_users
                        .iter()
                        .filter(|t| t.broadcast_id == b.id)
                        .map(|t| t.user_id.clone())
                        .collect(),
                };
                audience::can_view_broadcast(viewer, b, &membership, now)
            })
            .collect();

        Ok(visible)
    }

    /// List the viewer's own broadcasts.
    pub async fn my_broadcasts(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<broadcast::Model>> {
        self.broadcast_repo
            .find_by_creator(&viewer.id, limit, offset)
            .await
    }

    /// Update a broadcast. Only the author or staff may update.
    pub async fn update(
        &self,
        viewer: &user::Model,
        id: &str,
        input: UpdateBroadcast,
    ) -> AppResult<broadcast::Model> {
        let (existing, _) = self.load_visible(viewer, id).await?;

        if existing.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may update a broadcast".to_string(),
            ));
        }

        let starts_at = input.starts_at.unwrap_or_else(|| existing.starts_at.into());
        let ends_at = input.ends_at.unwrap_or_else(|| existing.ends_at.into());
        if starts_at >= ends_at {
            return Err(AppError::Validation(
                "starts_at must be before ends_at".to_string(),
            ));
        }

        self.broadcast_repo
            .update(
                id,
                input.title,
                input.body,
                input.priority,
                input.starts_at,
                input.ends_at,
                input.send_email,
                input.is_published,
            )
            .await
    }

    /// Soft-delete a broadcast. Only the author or staff may delete;
    /// view logs are kept.
    pub async fn delete(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        let (existing, _) = self.load_visible(viewer, id).await?;

        if existing.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may delete a broadcast".to_string(),
            ));
        }

        self.broadcast_repo.soft_delete(id).await
    }

    /// Acknowledge or withdraw an acknowledgment. Only live
    /// broadcasts accept acknowledgments; the operation is idempotent
    /// and withdrawals leave no trace.
    pub async fn acknowledge(
        &self,
        viewer: &user::Model,
        id: &str,
        acknowledged: bool,
    ) -> AppResult<bool> {
        let (model, membership) = self.load_visible(viewer, id).await?;

        if !audience::can_act_on_broadcast(viewer, &model, &membership, Utc::now()) {
            return Err(AppError::Forbidden(
                "Broadcast is not currently live".to_string(),
            ));
        }

        if acknowledged {
            self.broadcast_repo.acknowledge(id, &viewer.id).await?;
        } else {
            self.broadcast_repo
                .withdraw_acknowledgment(id, &viewer.id)
                .await?;
        }

        Ok(acknowledged)
    }

    /// Record that the viewer saw a broadcast. At most one view row
    /// per (broadcast, user); repeat calls are no-ops.
    pub async fn mark_viewed(
        &self,
        viewer: &user::Model,
        id: &str,
        ip_address: Option<String>,
    ) -> AppResult<()> {
        let (model, membership) = self.load_visible(viewer, id).await?;

        if !audience::can_act_on_broadcast(viewer, &model, &membership, Utc::now()) {
            return Err(AppError::Forbidden(
                "Broadcast is not currently live".to_string(),
            ));
        }

        self.broadcast_repo
            .record_view(id, &viewer.id, ip_address)
            .await?;

        Ok(())
    }

    /// Engagement analytics for a broadcast. Author or staff only.
    pub async fn analytics(&self, viewer: &user::Model, id: &str) -> AppResult<BroadcastAnalytics> {
        let (model, _) = self.load_visible(viewer, id).await?;

        if model.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may view analytics".to_string(),
            ));
        }

        let total_recipients = match model.audience {
            broadcast::BroadcastAudience::All => self.user_repo.count_active().await?,
            broadcast::BroadcastAudience::Groups => {
                let group_ids = self.broadcast_repo.target_group_ids(id).await?;
                self.group_repo.member_user_ids(&group_ids).await?.len() as u64
            }
            broadcast::BroadcastAudience::Users => {
                self.broadcast_repo.target_user_ids(id).await?.len() as u64
            }
        };

        let total_views = self.broadcast_repo.count_views(id).await?;
        let total_acknowledgments = self.broadcast_repo.count_acknowledgments(id).await?;

        let today = Utc::now().date_naive();
        let views = self
            .broadcast_repo
            .views_since(id, analytics::window_start(today))
            .await?;
        let timestamps: Vec<DateTime<Utc>> = views.iter().map(|v| v.viewed_at.into()).collect();

        Ok(BroadcastAnalytics {
            total_recipients,
            total_views,
            total_acknowledgments,
            view_rate: analytics::rate(total_views, total_recipients),
            acknowledgment_rate: analytics::rate(total_acknowledgments, total_recipients),
            daily_views: analytics::daily_buckets(&timestamps, today),
        })
    }

    /// Whether the viewer has acknowledged a broadcast.
    pub async fn has_acknowledged(&self, viewer: &user::Model, id: &str) -> AppResult<bool> {
        self.broadcast_repo.has_acknowledged(id, &viewer.id).await
    }

    /// Whether the viewer has a recorded view for a broadcast.
    pub async fn has_viewed(&self, viewer: &user::Model, id: &str) -> AppResult<bool> {
        self.broadcast_repo.has_viewed(id, &viewer.id).await
    }

    /// Media IDs attached to a broadcast the viewer can see.
    pub async fn attachment_media_ids(
        &self,
        viewer: &user::Model,
        id: &str,
    ) -> AppResult<Vec<String>> {
        self.load_visible(viewer, id).await?;
        self.broadcast_repo.attachment_media_ids(id).await
    }

    /// Load a broadcast and the viewer's membership facts, collapsing
    /// both missing and hidden to not-found.
    async fn load_visible(
        &self,
        viewer: &user::Model,
        id: &str,
    ) -> AppResult<(broadcast::Model, Membership)> {
        let model = self
            .broadcast_repo
            .find_by_id(id)
            .await?
            .filter(|b| b.is_active)
            .ok_or_else(|| AppError::BroadcastNotFound(id.to_string()))?;

        let membership = Membership {
            viewer_group_ids: self
                .group_repo
                .group_ids_for_user(&viewer.id)
                .await?
                .into_iter()
                .collect(),
            target_group_ids: self
                .broadcast_repo
                .target_group_ids(id)
                .await?
                .into_iter()
                .collect(),
            target_user_ids: self
                .broadcast_repo
                .target_user_ids(id)
                .await?
                .into_iter()
                .collect(),
        };

        if !audience::can_view_broadcast(viewer, &model, &membership, Utc::now()) {
            return Err(AppError::BroadcastNotFound(id.to_string()));
        }

        Ok((model, membership))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::collections::BTreeMap;

    use super::super::notify::NoOpDispatch;

    fn make_user(id: &str, is_staff: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            name: None,
            token: None,
            department: None,
            is_staff,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn make_broadcast(id: &str, created_by: &str, live: bool) -> broadcast::Model {
        let now = Utc::now();
        let (start, end) = if live {
            (now - Duration::hours(1), now + Duration::hours(1))
        } else {
            (now + Duration::hours(1), now + Duration::hours(2))
        };
        broadcast::Model {
            id: id.to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            priority: broadcast::BroadcastPriority::Normal,
            audience: broadcast::BroadcastAudience::All,
            starts_at: start.into(),
            ends_at: end.into(),
            send_email: false,
            is_published: true,
            is_active: true,
            created_by: created_by.to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> BroadcastService {
        BroadcastService::new(
            BroadcastRepository::new(db.clone()),
            GroupRepository::new(db.clone()),
            UserRepository::new(db),
            Arc::new(NoOpDispatch),
        )
    }

    fn empty_id_rows() -> Vec<BTreeMap<&'static str, sea_orm::Value>> {
        Vec::new()
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_window() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);
        let creator = make_user("u1", false);
        let now = Utc::now();

        let result = svc
            .create(
                &creator,
                CreateBroadcast {
                    title: "t".to_string(),
                    body: "b".to_string(),
                    priority: broadcast::BroadcastPriority::Normal,
                    audience: broadcast::BroadcastAudience::All,
                    starts_at: now + Duration::hours(2),
                    ends_at: now + Duration::hours(1),
                    send_email: false,
                    is_published: true,
                    target_group_ids: vec![],
                    target_user_ids: vec![],
                    attachment_media_ids: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<broadcast::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.get(&viewer, "nope").await;

        assert!(matches!(result, Err(AppError::BroadcastNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_hidden_collapses_to_not_found() {
        // Future-dated broadcast, regular non-creator viewer.
        let hidden = make_broadcast("b1", "author", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[hidden]])
                // viewer group ids, target group ids, target user ids
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.get(&viewer, "b1").await;

        assert!(matches!(result, Err(AppError::BroadcastNotFound(_))));
    }

    #[tokio::test]
    async fn test_acknowledge_non_live_is_forbidden_for_creator() {
        // The creator can see their future-dated broadcast but still
        // cannot acknowledge it.
        let future = make_broadcast("b1", "u1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[future]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let creator = make_user("u1", false);

        let result = svc.acknowledge(&creator, "b1", true).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_analytics_rate_two_of_three() {
        let model = {
            let mut b = make_broadcast("b1", "u1", true);
            b.audience = broadcast::BroadcastAudience::Users;
            b
        };

        let target_rows: Vec<BTreeMap<&str, sea_orm::Value>> = vec![
            maplit::btreemap! { "user_id" => sea_orm::Value::from("u2") },
            maplit::btreemap! { "user_id" => sea_orm::Value::from("u3") },
            maplit::btreemap! { "user_id" => sea_orm::Value::from("u4") },
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model]])
                // load_visible membership lookups
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                // recipient count: three targeted users
                .append_query_results([target_rows])
                // view count, ack count
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                // daily window rows
                .append_query_results([Vec::<bullhorn_db::entities::broadcast_view::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);
        let author = make_user("u1", false);

        let analytics = svc.analytics(&author, "b1").await.unwrap();

        assert_eq!(analytics.total_recipients, 3);
        assert_eq!(analytics.total_acknowledgments, 2);
        assert!((analytics.acknowledgment_rate - 66.666_666).abs() < 0.1);
        assert_eq!(analytics.daily_views.len(), 30);
    }

    #[tokio::test]
    async fn test_has_viewed_reflects_view_row() {
        let view = bullhorn_db::entities::broadcast_view::Model {
            id: "v1".to_string(),
            broadcast_id: "b1".to_string(),
            user_id: "u1".to_string(),
            ip_address: None,
            viewed_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[view]])
                .append_query_results([Vec::<bullhorn_db::entities::broadcast_view::Model>::new()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        assert!(svc.has_viewed(&viewer, "b1").await.unwrap());
        assert!(!svc.has_viewed(&viewer, "b2").await.unwrap());
    }

    #[tokio::test]
    async fn test_analytics_forbidden_for_non_author() {
        let live = make_broadcast("b1", "author", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[live]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.analytics(&viewer, "b1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
