//! Media endpoints.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    response::Response,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bullhorn_common::{AppError, AppResult};
use bullhorn_db::entities::media;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{created, ApiResponse},
};

/// Create media router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/", post(upload_media))
        .route("/my_uploads", get(my_uploads))
        .route("/{id}", get(get_media))
        .route("/{id}", delete(delete_media))
}

/// Media response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: String,
    pub file_name: String,
    pub file_kind: media::MediaKind,
    pub file_size: i64,
    pub url: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<media::Model> for MediaResponse {
    fn from(m: media::Model) -> Self {
        Self {
            id: m.id,
            file_name: m.file_name,
            file_kind: m.file_kind,
            file_size: m.file_size,
            url: m.url,
            uploaded_by: m.uploaded_by,
            uploaded_at: m.uploaded_at.into(),
        }
    }
}

/// List media response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListResponse {
    pub media: Vec<MediaResponse>,
    pub total: u64,
}

/// List media query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMediaQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// List uploads visible to the viewer.
async fn list_media(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> AppResult<ApiResponse<MediaListResponse>> {
    let media = state
        .media_service
        .list(&user, query.limit, query.offset)
        .await?;
    let total = media.len() as u64;

    Ok(ApiResponse::ok(MediaListResponse {
        media: media.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Upload a file via multipart form.
async fn upload_media(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            file_name = field.file_name().map(std::string::ToString::to_string);
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .to_vec(),
            );
        }
    }

    let data = file_data.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("Missing file name".to_string()))?;

    let model = state.media_service.upload(&user, &file_name, &data).await?;

    Ok(created(MediaResponse::from(model)))
}

/// The viewer's own uploads.
async fn my_uploads(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListMediaQuery>,
) -> AppResult<ApiResponse<MediaListResponse>> {
    let media = state
        .media_service
        .my_uploads(&user, query.limit, query.offset)
        .await?;
    let total = media.len() as u64;

    Ok(ApiResponse::ok(MediaListResponse {
        media: media.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Get an upload.
async fn get_media(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MediaResponse>> {
    let model = state.media_service.get(&user, &id).await?;
    Ok(ApiResponse::ok(MediaResponse::from(model)))
}

/// Delete an upload.
async fn delete_media(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl axum::response::IntoResponse> {
    state.media_service.delete(&user, &id).await?;
    Ok(crate::response::ok())
}
