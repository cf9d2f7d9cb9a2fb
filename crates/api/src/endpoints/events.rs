//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use bullhorn_common::AppResult;
use bullhorn_core::{CreateEvent, EventAnalytics, UpdateEvent};
use bullhorn_db::entities::{event, event_rsvp};
use bullhorn_db::repositories::EventFilter;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Create event router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events))
        .route("/", post(create_event))
        .route("/upcoming", get(upcoming_events))
        .route("/my_events", get(my_events))
        .route("/{id}", get(get_event))
        .route("/{id}", put(update_event))
        .route("/{id}", delete(delete_event))
        .route("/{id}/rsvp", get(my_rsvp))
        .route("/{id}/rsvp", post(rsvp))
        .route("/{id}/rsvp_list", get(rsvp_list))
        .route("/{id}/analytics", get(analytics))
}

/// Event response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_rsvp: Option<event_rsvp::RsvpStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<super::media::MediaResponse>>,
}

impl From<event::Model> for EventResponse {
    fn from(e: event::Model) -> Self {
        Self {
            id: e.id,
            title: e.title,
            body: e.body,
            event_type: e.event_type,
            starts_at: e.starts_at.into(),
            venue: e.venue,
            theme: e.theme,
            is_important: e.is_important,
            is_public: e.is_public,
            created_by: e.created_by,
            created_at: e.created_at.into(),
            updated_at: e.updated_at.map(Into::into),
            my_rsvp: None,
            media: None,
        }
    }
}

/// RSVP response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub event_id: String,
    pub user_id: String,
    pub status: event_rsvp::RsvpStatus,
    pub responded_at: DateTime<Utc>,
}

impl From<event_rsvp::Model> for RsvpResponse {
    fn from(r: event_rsvp::Model) -> Self {
        Self {
            event_id: r.event_id,
            user_id: r.user_id,
            status: r.status,
            responded_at: r.responded_at.into(),
        }
    }
}

/// List events response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    pub total: u64,
}

/// RSVP list response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpListResponse {
    pub rsvps: Vec<RsvpResponse>,
    pub total: u64,
}

/// List events query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub event_type: Option<event::EventType>,
    pub is_public: Option<bool>,
    #[serde(default)]
    pub upcoming: bool,
    /// Substring match on title or body.
    pub search: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Create event request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    pub event_type: event::EventType,
    pub starts_at: DateTime<Utc>,
    pub venue: Option<String>,
    pub theme: Option<serde_json::Value>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub visible_group_ids: Vec<String>,
    #[serde(default)]
    pub visible_user_ids: Vec<String>,
    #[serde(default)]
    pub media_ids: Vec<String>,
}

const fn default_true() -> bool {
    true
}

/// Update event request.
///
/// `venue` and `theme` are nullable: omitting the field leaves it
/// unchanged, sending `null` clears it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub event_type: Option<event::EventType>,
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::serde_util::double_option")]
    pub venue: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_util::double_option")]
    pub theme: Option<Option<serde_json::Value>>,
    pub is_important: Option<bool>,
    pub is_public: Option<bool>,
}

/// RSVP request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    pub status: event_rsvp::RsvpStatus,
}

/// List events visible to the viewer.
async fn list_events(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> AppResult<ApiResponse<EventListResponse>> {
    let filter = EventFilter {
        event_type: query.event_type,
        is_public: query.is_public,
        upcoming: query.upcoming,
        search: query.search,
    };

    let events = state
        .event_service
        .list(&user, &filter, query.limit, query.offset)
        .await?;
    let total = events.len() as u64;

    Ok(ApiResponse::ok(EventListResponse {
        events: events.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Create an event.
async fn create_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateEventRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let model = state
        .event_service
        .create(
            &user,
            CreateEvent {
                title: req.title,
                body: req.body,
                event_type: req.event_type,
                starts_at: req.starts_at,
                venue: req.venue,
                theme: req.theme,
                is_important: req.is_important,
                is_public: req.is_public,
                visible_group_ids: req.visible_group_ids,
                visible_user_ids: req.visible_user_ids,
                media_ids: req.media_ids,
            },
        )
        .await?;

    Ok(created(EventResponse::from(model)))
}

/// Upcoming events visible to the viewer.
async fn upcoming_events(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> AppResult<ApiResponse<EventListResponse>> {
    let events = state
        .event_service
        .upcoming(&user, query.limit, query.offset)
        .await?;
    let total = events.len() as u64;

    Ok(ApiResponse::ok(EventListResponse {
        events: events.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Events the viewer created.
async fn my_events(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> AppResult<ApiResponse<EventListResponse>> {
    let events = state
        .event_service
        .my_events(&user, query.limit, query.offset)
        .await?;
    let total = events.len() as u64;

    Ok(ApiResponse::ok(EventListResponse {
        events: events.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get an event, with the viewer's RSVP state.
async fn get_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EventResponse>> {
    let model = state.event_service.get(&user, &id).await?;
    let rsvp = state.event_service.my_rsvp(&user, &id).await?;
    let media_ids = state.event_service.media_ids(&user, &id).await?;
    let media = state.media_service.by_ids(&media_ids).await?;

    let mut response = EventResponse::from(model);
    response.my_rsvp = rsvp.map(|r| r.status);
    response.media = Some(media.into_iter().map(Into::into).collect());

    Ok(ApiResponse::ok(response))
}

/// Update an event.
async fn update_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> AppResult<ApiResponse<EventResponse>> {
    req.validate()?;

    let model = state
        .event_service
        .update(
            &user,
            &id,
            UpdateEvent {
                title: req.title,
                body: req.body,
                event_type: req.event_type,
                starts_at: req.starts_at,
                venue: req.venue,
                theme: req.theme,
                is_important: req.is_important,
                is_public: req.is_public,
            },
        )
        .await?;

    Ok(ApiResponse::ok(EventResponse::from(model)))
}

/// Soft-delete an event.
async fn delete_event(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.event_service.delete(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Respond to an event.
async fn rsvp(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RsvpRequest>,
) -> AppResult<ApiResponse<RsvpResponse>> {
    let model = state.event_service.rsvp(&user, &id, req.status).await?;
    Ok(ApiResponse::ok(RsvpResponse::from(model)))
}

/// The viewer's current RSVP, if any.
async fn my_rsvp(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Option<RsvpResponse>>> {
    // Visibility is enforced on the event itself first.
    state.event_service.get(&user, &id).await?;
    let rsvp = state.event_service.my_rsvp(&user, &id).await?;
    Ok(ApiResponse::ok(rsvp.map(Into::into)))
}

/// All RSVPs for an event.
async fn rsvp_list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RsvpListResponse>> {
    let rsvps = state.event_service.rsvp_list(&user, &id).await?;
    let total = rsvps.len() as u64;

    Ok(ApiResponse::ok(RsvpListResponse {
        rsvps: rsvps.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// RSVP analytics for an event.
async fn analytics(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EventAnalytics>> {
    let analytics = state.event_service.analytics(&user, &id).await?;
    Ok(ApiResponse::ok(analytics))
}
