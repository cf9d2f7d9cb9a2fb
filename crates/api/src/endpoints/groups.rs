//! Group endpoints.

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
use bullhorn_core::UpdateGroup;
use bullhorn_db::entities::group;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Create group router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups))
        .route("/", post(create_group))
        .route("/my_groups", get(my_groups))
        .route("/{id}", get(get_group))
        .route("/{id}", put(update_group))
        .route("/{id}", delete(delete_group))
        .route("/{id}/join", post(join_group))
        .route("/{id}/leave", post(leave_group))
        .route("/{id}/owners", post(add_owner))
        .route("/{id}/owners/{user_id}", delete(remove_owner))
}

/// Group response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub group_type: group::GroupType,
    pub department: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

impl From<group::Model> for GroupResponse {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            description: g.description,
            group_type: g.group_type,
            department: g.department,
            created_by: g.created_by,
            created_at: g.created_at.into(),
            updated_at: g.updated_at.map(Into::into),
            member_count: None,
        }
    }
}

/// List groups response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupListResponse {
    pub groups: Vec<GroupResponse>,
    pub total: u64,
}

/// List groups query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListGroupsQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Create group request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_group_type")]
    pub group_type: group::GroupType,
    pub department: Option<String>,
}

const fn default_group_type() -> group::GroupType {
    group::GroupType::Public
}

/// Update group request.
///
/// `description` and `department` are nullable: omitting the field
/// leaves it unchanged, sending `null` clears it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_util::double_option")]
    pub description: Option<Option<String>>,
    pub group_type: Option<group::GroupType>,
    #[serde(default, deserialize_with = "crate::serde_util::double_option")]
    pub department: Option<Option<String>>,
}

/// List groups visible to the viewer.
async fn list_groups(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListGroupsQuery>,
) -> AppResult<ApiResponse<GroupListResponse>> {
    let groups = state
        .group_service
        .list(&user, query.limit, query.offset)
        .await?;
    let total = groups.len() as u64;

    Ok(ApiResponse::ok(GroupListResponse {
        groups: groups.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Create a group.
async fn create_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let model = state
        .group_service
        .create(&user, req.name, req.description, req.group_type, req.department)
        .await?;

    Ok(created(GroupResponse::from(model)))
}

/// Groups the viewer belongs to.
async fn my_groups(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<GroupListResponse>> {
    let groups = state.group_service.my_groups(&user).await?;
    let total = groups.len() as u64;

    Ok(ApiResponse::ok(GroupListResponse {
        groups: groups.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get a group, with its member count.
async fn get_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let model = state.group_service.get(&user, &id).await?;
    let member_count = state.group_service.member_count(&user, &id).await?;

    let mut response = GroupResponse::from(model);
    response.member_count = Some(member_count);

    Ok(ApiResponse::ok(response))
}

/// Update a group.
async fn update_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    req.validate()?;

    let model = state
        .group_service
        .update(
            &user,
            &id,
            UpdateGroup {
                name: req.name,
                description: req.description,
                group_type: req.group_type,
                department: req.department,
            },
        )
        .await?;

    Ok(ApiResponse::ok(GroupResponse::from(model)))
}

/// Soft-delete a group.
async fn delete_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.delete(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Join a public group.
async fn join_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.join(&user, &id).await?;
    Ok(crate::response::ok())
}

/// Add owner request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOwnerRequest {
    pub user_id: String,
}

/// Add an owner to a group.
async fn add_owner(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddOwnerRequest>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.add_owner(&user, &id, &req.user_id).await?;
    Ok(crate::response::ok())
}

/// Remove an owner from a group.
async fn remove_owner(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.remove_owner(&user, &id, &user_id).await?;
    Ok(crate::response::ok())
}

/// Leave a group.
async fn leave_group(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.group_service.leave(&user, &id).await?;
    Ok(crate::response::ok())
}
