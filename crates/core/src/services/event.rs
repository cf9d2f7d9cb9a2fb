//! Event service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use bullhorn_common::{AppError, AppResult, IdGenerator};
use bullhorn_db::entities::{event, event_rsvp, user};
use bullhorn_db::repositories::{
    EventFilter, EventRepository, GroupRepository, NewEvent, UserRepository,
};

use super::analytics::{self, EventAnalytics};
use super::audience::{self, Membership};
use super::notify::NotificationDispatch;

/// Input for creating an event.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub body: String,
    pub event_type: event::EventType,
    pub starts_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub theme: Option<serde_json::Value>,
    pub is_important: bool,
    pub is_public: bool,
    pub visible_group_ids: Vec<String>,
    pub visible_user_ids: Vec<String>,
    pub media_ids: Vec<String>,
}

/// Input for updating an event. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub event_type: Option<event::EventType>,
    pub starts_at: Option<DateTime<Utc>>,
    pub venue: Option<Option<String>>,
    pub theme: Option<Option<serde_json::Value>>,
    pub is_important: Option<bool>,
    pub is_public: Option<bool>,
}

/// Service for event and RSVP operations.
#[derive(Clone)]
pub struct EventService {
    event_repo: EventRepository,
    group_repo: GroupRepository,
    user_repo: UserRepository,
    notify: Arc<dyn NotificationDispatch>,
    id_gen: IdGenerator,
}

impl EventService {
    /// Create a new event service.
    #[must_use]
    pub fn new(
        event_repo: EventRepository,
        group_repo: GroupRepository,
        user_repo: UserRepository,
        notify: Arc<dyn NotificationDispatch>,
    ) -> Self {
        Self {
            event_repo,
            group_repo,
            user_repo,
            notify,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create an event. Events must be future-dated; notification
    /// emails are queued on creation and a queue failure never fails
    /// the request.
    pub async fn create(&self, creator: &user::Model, input: CreateEvent) -> AppResult<event::Model> {
        if input.starts_at <= Utc::now() {
            return Err(AppError::Validation(
                "starts_at must be in the future".to_string(),
            ));
        }

        let model = self
            .event_repo
            .create(NewEvent {
                id: self.id_gen.generate(),
                title: input.title,
                body: input.body,
                event_type: input.event_type,
                starts_at: input.starts_at,
                venue: input.venue,
                theme: input.theme,
                is_important: input.is_important,
                is_public: input.is_public,
                created_by: creator.id.clone(),
                visible_group_ids: input.visible_group_ids,
                visible_user_ids: input.visible_user_ids,
                media_ids: input.media_ids,
            })
            .await?;

        if let Err(e) = self.notify.queue_event_email(&model.id).await {
            warn!(event_id = %model.id, error = %e, "Failed to queue event emails");
        }

        Ok(model)
    }

    /// Get an event the viewer is allowed to see.
    pub async fn get(&self, viewer: &user::Model, id: &str) -> AppResult<event::Model> {
        let (model, _) = self.load_visible(viewer, id).await?;
        Ok(model)
    }

    /// List events the viewer can see. Staff see everything that
    /// matches the filter.
    pub async fn list(
        &self,
        viewer: &user::Model,
        filter: &EventFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        let rows = self.event_repo.find_all(filter, limit, offset).await?;

        if viewer.is_staff {
            return Ok(rows);
        }

        let viewer_group_ids: std::collections::HashSet<String> = self
            .group_repo
            .group_ids_for_user(&viewer.id)
            .await?
            .into_iter()
            .collect();

        let ids: Vec<String> = rows.iter().map(|e| e.id.clone()).collect();
        let visible_groups = self.event_repo.visible_groups_for_many(&ids).await?;
        let visible_users = self.event_repo.visible_users_for_many(&ids).await?;

        let visible = rows
            .into_iter()
            .filter(|e| {
                let membership = Membership {
                    viewer_group_ids: viewer_group_ids.clone(),
                    target_group_ids: visible_groups
                        .iter()
                        .filter(|v| v.event_id == e.id)
                        .map(|v| v.group_id.clone())
                        .collect(),
                    target_user_ids: visible_users
                        .iter()
                        .filter(|v| v.event_id == e.id)
                        .map(|v| v.user_id.clone())
                        .collect(),
                };
                audience::can_view_event(viewer, e, &membership)
            })
            .collect();

        Ok(visible)
    }

    /// Upcoming events visible to the viewer.
    pub async fn upcoming(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        let filter = EventFilter { upcoming: true, ..EventFilter::default() };
        self.list(viewer, &filter, limit, offset).await
    }

    /// List the viewer's own events.
    pub async fn my_events(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<event::Model>> {
        self.event_repo.find_by_creator(&viewer.id, limit, offset).await
    }

    /// Update an event. Only the author or staff may update.
    pub async fn update(
        &self,
        viewer: &user::Model,
        id: &str,
        input: UpdateEvent,
    ) -> AppResult<event::Model> {
        let (existing, _) = self.load_visible(viewer, id).await?;

        if existing.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may update an event".to_string(),
            ));
        }

        if let Some(starts_at) = input.starts_at {
            if starts_at <= Utc::now() {
                return Err(AppError::Validation(
                    "starts_at must be in the future".to_string(),
                ));
            }
        }

        self.event_repo
            .update(
                id,
                input.title,
                input.body,
                input.event_type,
                input.starts_at,
                input.venue,
                input.theme,
                input.is_important,
                input.is_public,
            )
            .await
    }

    /// Soft-delete an event. Only the author or staff may delete.
    pub async fn delete(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        let (existing, _) = self.load_visible(viewer, id).await?;

        if existing.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may delete an event".to_string(),
            ));
        }

        self.event_repo.soft_delete(id).await
    }

    /// Set the viewer's RSVP. The status row is exclusive per
    /// (event, user) and every transition is logged. Responses close
    /// once the event starts.
    pub async fn rsvp(
        &self,
        viewer: &user::Model,
        id: &str,
        status: event_rsvp::RsvpStatus,
    ) -> AppResult<event_rsvp::Model> {
        let (model, membership) = self.load_visible(viewer, id).await?;

        if !audience::can_rsvp_event(viewer, &model, &membership, Utc::now()) {
            return Err(AppError::Forbidden(
                "Event is no longer accepting responses".to_string(),
            ));
        }

        let (_, rsvp) = self.event_repo.set_rsvp(id, &viewer.id, status).await?;
        Ok(rsvp)
    }

    /// The viewer's current RSVP, if any.
    pub async fn my_rsvp(
        &self,
        viewer: &user::Model,
        id: &str,
    ) -> AppResult<Option<event_rsvp::Model>> {
        self.event_repo.find_rsvp(id, &viewer.id).await
    }

    /// All RSVPs for an event. Author or staff only.
    pub async fn rsvp_list(
        &self,
        viewer: &user::Model,
        id: &str,
    ) -> AppResult<Vec<event_rsvp::Model>> {
        let (model, _) = self.load_visible(viewer, id).await?;

        if model.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may list responses".to_string(),
            ));
        }

        self.event_repo.rsvps_for_event(id).await
    }

    /// Media IDs attached to an event the viewer can see.
    pub async fn media_ids(&self, viewer: &user::Model, id: &str) -> AppResult<Vec<String>> {
        self.load_visible(viewer, id).await?;
        self.event_repo.media_ids(id).await
    }

    /// RSVP analytics for an event. Author or staff only.
    pub async fn analytics(&self, viewer: &user::Model, id: &str) -> AppResult<EventAnalytics> {
        let (model, _) = self.load_visible(viewer, id).await?;

        if model.created_by != viewer.id && !viewer.is_staff {
            return Err(AppError::Forbidden(
                "Only the author or staff may view analytics".to_string(),
            ));
        }

        let yes_count = self
            .event_repo
            .count_rsvps(id, event_rsvp::RsvpStatus::Yes)
            .await?;
        let no_count = self
            .event_repo
            .count_rsvps(id, event_rsvp::RsvpStatus::No)
            .await?;
        let maybe_count = self
            .event_repo
            .count_rsvps(id, event_rsvp::RsvpStatus::Maybe)
            .await?;
        let total_responses = yes_count + no_count + maybe_count;

        let total_visible_users = if model.is_public {
            self.user_repo.count_active().await?
        } else {
            let direct = self.event_repo.visible_user_ids(id).await?;
            let group_ids = self.event_repo.visible_group_ids(id).await?;
            let via_groups = self.group_repo.member_user_ids(&group_ids).await?;

            let mut all: std::collections::HashSet<String> = direct.into_iter().collect();
            all.extend(via_groups);
            all.len() as u64
        };

        let today = Utc::now().date_naive();
        let logs = self
            .event_repo
            .rsvp_logs_since(id, analytics::window_start(today))
            .await?;
        let timestamps: Vec<DateTime<Utc>> = logs.iter().map(|l| l.changed_at.into()).collect();

        Ok(EventAnalytics {
            yes_count,
            no_count,
            maybe_count,
            total_responses,
            total_visible_users,
            rsvp_rate: analytics::rate(total_responses, total_visible_users),
            daily_rsvps: analytics::daily_buckets(&timestamps, today),
        })
    }

    /// Load an event and the viewer's membership facts, collapsing
    /// both missing and hidden to not-found.
    async fn load_visible(
        &self,
        viewer: &user::Model,
        id: &str,
    ) -> AppResult<(event::Model, Membership)> {
        let model = self
            .event_repo
            .find_by_id(id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::EventNotFound(id.to_string()))?;

        let membership = Membership {
            viewer_group_ids: self
                .group_repo
                .group_ids_for_user(&viewer.id)
                .await?
                .into_iter()
                .collect(),
            target_group_ids: self
                .event_repo
                .visible_group_ids(id)
                .await?
                .into_iter()
                .collect(),
            target_user_ids: self
                .event_repo
                .visible_user_ids(id)
                .await?
                .into_iter()
                .collect(),
        };

        if !audience::can_view_event(viewer, &model, &membership) {
            return Err(AppError::EventNotFound(id.to_string()));
        }

        Ok((model, membership))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
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

    fn make_event(id: &str, created_by: &str, is_public: bool, starts_in_hours: i64) -> event::Model {
        let now = Utc::now();
        event::Model {
            id: id.to_string(),
            title: "Event".to_string(),
            body: "Details".to_string(),
            event_type: event::EventType::Internal,
            starts_at: (now + Duration::hours(starts_in_hours)).into(),
            venue: None,
            theme: None,
            is_important: false,
            is_public,
            is_active: true,
            created_by: created_by.to_string(),
            created_at: now.into(),
            updated_at: None,
        }
    }

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> EventService {
        EventService::new(
            EventRepository::new(db.clone()),
            GroupRepository::new(db.clone()),
            UserRepository::new(db),
            Arc::new(NoOpDispatch),
        )
    }

    fn empty_id_rows() -> Vec<BTreeMap<&'static str, sea_orm::Value>> {
        Vec::new()
    }

    #[tokio::test]
    async fn test_create_rejects_past_event() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = service(db);
        let creator = make_user("u1", false);

        let result = svc
            .create(
                &creator,
                CreateEvent {
                    title: "t".to_string(),
                    body: "b".to_string(),
                    event_type: event::EventType::Internal,
                    starts_at: Utc::now() - Duration::hours(1),
                    venue: None,
                    theme: None,
                    is_important: false,
                    is_public: true,
                    visible_group_ids: vec![],
                    visible_user_ids: vec![],
                    media_ids: vec![],
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_hidden_event_collapses_to_not_found() {
        let private = make_event("e1", "author", false, 24);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[private]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.get(&viewer, "e1").await;

        assert!(matches!(result, Err(AppError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn test_rsvp_on_started_event_is_forbidden() {
        let started = make_event("e1", "author", true, -1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[started]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.rsvp(&viewer, "e1", event_rsvp::RsvpStatus::Yes).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_rsvp_upserts_and_logs() {
        let upcoming = make_event("e1", "author", true, 24);
        let rsvp = event_rsvp::Model {
            id: "r1".to_string(),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            status: event_rsvp::RsvpStatus::Maybe,
            responded_at: Utc::now().into(),
        };
        let log = bullhorn_db::entities::event_rsvp_log::Model {
            id: "l1".to_string(),
            event_id: "e1".to_string(),
            user_id: "u1".to_string(),
            old_status: Some(event_rsvp::RsvpStatus::Yes),
            new_status: event_rsvp::RsvpStatus::Maybe,
            changed_at: Utc::now().into(),
        };
        let existing = event_rsvp::Model {
            status: event_rsvp::RsvpStatus::Yes,
            ..rsvp.clone()
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[upcoming]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                // inside set_rsvp: existing row, updated row, log row
                .append_query_results([[existing]])
                .append_query_results([[rsvp]])
                .append_query_results([[log]])
                .append_exec_results([
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                    MockExecResult { last_insert_id: 0, rows_affected: 1 },
                ])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc
            .rsvp(&viewer, "e1", event_rsvp::RsvpStatus::Maybe)
            .await
            .unwrap();

        assert_eq!(result.status, event_rsvp::RsvpStatus::Maybe);
    }

    #[tokio::test]
    async fn test_my_events_returns_created_events_only() {
        let mine = make_event("e1", "u1", false, 24);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[mine]])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let events = svc.my_events(&viewer, 20, 0).await.unwrap();

        // Authored events come back even when the viewer would not
        // otherwise be in the audience.
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created_by, "u1");
    }

    #[tokio::test]
    async fn test_rsvp_list_forbidden_for_regular_viewer() {
        let public = make_event("e1", "author", true, 24);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[public]])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .append_query_results([empty_id_rows()])
                .into_connection(),
        );
        let svc = service(db);
        let viewer = make_user("u1", false);

        let result = svc.rsvp_list(&viewer, "e1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
