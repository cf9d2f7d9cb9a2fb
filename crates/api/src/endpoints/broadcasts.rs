//! Broadcast endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use bullhorn_common::AppResult;
use bullhorn_core::{BroadcastAnalytics, CreateBroadcast, UpdateBroadcast};
use bullhorn_db::entities::broadcast;
use bullhorn_db::repositories::BroadcastFilter;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Create broadcast router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_broadcasts))
        .route("/", post(create_broadcast))
        .route("/my_broadcasts", get(my_broadcasts))
        .route("/{id}", get(get_broadcast))
        .route("/{id}", put(update_broadcast))
        .route("/{id}", delete(delete_broadcast))
        .route("/{id}/acknowledge", post(acknowledge))
        .route("/{id}/mark_viewed", post(mark_viewed))
        .route("/{id}/analytics", get(analytics))
}

/// Broadcast response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<super::media::MediaResponse>>,
}

impl From<broadcast::Model> for BroadcastResponse {
    fn from(b: broadcast::Model) -> Self {
        Self {
            id: b.id,
            title: b.title,
            body: b.body,
            priority: b.priority,
            audience: b.audience,
            starts_at: b.starts_at.into(),
            ends_at: b.ends_at.into(),
            send_email: b.send_email,
            is_published: b.is_published,
            created_by: b.created_by,
            created_at: b.created_at.into(),
            updated_at: b.updated_at.map(Into::into),
            acknowledged: None,
            viewed: None,
            attachments: None,
        }
    }
}

/// List broadcasts response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastListResponse {
    pub broadcasts: Vec<BroadcastResponse>,
    pub total: u64,
}

/// List broadcasts query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBroadcastsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    pub priority: Option<broadcast::BroadcastPriority>,
    pub audience: Option<broadcast::BroadcastAudience>,
    pub is_published: Option<bool>,
    /// Substring match on title or body.
    pub search: Option<String>,
}

const fn default_limit() -> u64 {
    20
}

/// Create broadcast request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBroadcastRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub body: String,
    #[serde(default = "default_priority")]
    pub priority: broadcast::BroadcastPriority,
    pub audience: broadcast::BroadcastAudience,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub send_email: bool,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub target_group_ids: Vec<String>,
    #[serde(default)]
    pub target_user_ids: Vec<String>,
    #[serde(default)]
    pub attachment_media_ids: Vec<String>,
}

const fn default_priority() -> broadcast::BroadcastPriority {
    broadcast::BroadcastPriority::Normal
}

const fn default_true() -> bool {
    true
}

/// Update broadcast request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBroadcastRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub body: Option<String>,
    pub priority: Option<broadcast::BroadcastPriority>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub send_email: Option<bool>,
    pub is_published: Option<bool>,
}

/// Acknowledge request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub acknowledged: bool,
}

/// Acknowledge response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeResponse {
    pub acknowledged: bool,
}

/// List broadcasts visible to the viewer.
async fn list_broadcasts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListBroadcastsQuery>,
) -> AppResult<ApiResponse<BroadcastListResponse>> {
    let filter = BroadcastFilter {
        priority: query.priority,
        audience: query.audience,
        is_published: query.is_published,
        search: query.search,
    };

    let broadcasts = state
        .broadcast_service
        .list(&user, &filter, query.limit, query.offset)
        .await?;
    let total = broadcasts.len() as u64;

    Ok(ApiResponse::ok(BroadcastListResponse {
        broadcasts: broadcasts.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Create a broadcast.
async fn create_broadcast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateBroadcastRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let model = state
        .broadcast_service
        .create(
            &user,
            CreateBroadcast {
                title: req.title,
                body: req.body,
                priority: req.priority,
                audience: req.audience,
                starts_at: req.starts_at,
                ends_at: req.ends_at,
                send_email: req.send_email,
                is_published: req.is_published,
                target_group_ids: req.target_group_ids,
                target_user_ids: req.target_user_ids,
                attachment_media_ids: req.attachment_media_ids,
            },
        )
        .await?;

    Ok(created(BroadcastResponse::from(model)))
}

/// List the viewer's own broadcasts.
async fn my_broadcasts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListBroadcastsQuery>,
) -> AppResult<ApiResponse<BroadcastListResponse>> {
    let broadcasts = state
        .broadcast_service
        .my_broadcasts(&user, query.limit, query.offset)
        .await?;
    let total = broadcasts.len() as u64;

    Ok(ApiResponse::ok(BroadcastListResponse {
        broadcasts: broadcasts.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get a broadcast, with the viewer's acknowledgment and view state.
async fn get_broadcast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BroadcastResponse>> {
    let model = state.broadcast_service.get(&user, &id).await?;
    let acknowledged = state.broadcast_service.has_acknowledged(&user, &id).await?;
    let viewed = state.broadcast_service.has_viewed(&user, &id).await?;
    let media_ids = state
        .broadcast_service
        .attachment_media_ids(&user, &id)
        .await?;
    let attachments = state.media_service.by_ids(&media_ids).await?;

    let mut response = BroadcastResponse::from(model);
    response.acknowledged = Some(acknowledged);
    response.viewed = Some(viewed);
    response.attachments = Some(attachments.into_iter().map(Into::into).collect());

    Ok(ApiResponse::ok(response))
}

/// Update a broadcast.
async fn update_broadcast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateBroadcastRequest>,
) -> AppResult<ApiResponse<BroadcastResponse>> {
    req.validate()?;

    let model = state
        .broadcast_service
        .update(
            &user,
            &id,
            UpdateBroadcast {
                title: req.title,
                body: req.body,
                priority: req.priority,
                starts_at: req.starts_at,
                ends_at: req.ends_at,
                send_email: req.send_email,
                is_published: req.is_published,
            },
        )
        .await?;

    Ok(ApiResponse::ok(BroadcastResponse::from(model)))
}

/// Soft-delete a broadcast.
async fn delete_broadcast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.broadcast_service.delete(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Acknowledge or withdraw acknowledgment of a broadcast.
async fn acknowledge(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AcknowledgeRequest>,
) -> AppResult<ApiResponse<AcknowledgeResponse>> {
    let acknowledged = state
        .broadcast_service
        .acknowledge(&user, &id, req.acknowledged)
        .await?;

    Ok(ApiResponse::ok(AcknowledgeResponse { acknowledged }))
}

/// Record that the viewer saw a broadcast.
async fn mark_viewed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> AppResult<impl axum::response::IntoResponse> {
    let ip_address = client_ip(&headers);
    state.broadcast_service.mark_viewed(&user, &id, ip_address).await?;
    Ok(crate::response::ok())
}

/// Engagement analytics for a broadcast.
async fn analytics(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BroadcastAnalytics>> {
    let analytics = state.broadcast_service.analytics(&user, &id).await?;
    Ok(ApiResponse::ok(analytics))
}

/// Client IP from the X-Forwarded-For header, first hop.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());

        assert_eq!(client_ip(&headers), Some("10.0.0.1".to_string()));
    }

    #[test]
    fn test_client_ip_missing_header() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
