//! Media repository.

use std::sync::Arc;

use bullhorn_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{Media, media};

/// Repository for uploaded media metadata.
#[derive(Clone)]
pub struct MediaRepository {
    db: Arc<DatabaseConnection>,
}

impl MediaRepository {
    /// Create a new media repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record an uploaded file.
    pub async fn create(
        &self,
        id: String,
        file_name: String,
        file_kind: media::MediaKind,
        file_size: i64,
        storage_key: String,
        url: String,
        uploaded_by: String,
    ) -> AppResult<media::Model> {
        let active_model = media::ActiveModel {
            id: Set(id),
            file_name: Set(file_name),
            file_kind: Set(file_kind),
            file_size: Set(file_size),
            storage_key: Set(storage_key),
            url: Set(url),
            uploaded_by: Set(uploaded_by),
            uploaded_at: Set(Utc::now().into()),
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find media by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<media::Model>> {
        Media::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find media rows by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<media::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Media::find()
            .filter(media::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all uploads (staff view).
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<media::Model>> {
        Media::find()
            .order_by(media::Column::UploadedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List uploads by a user.
    pub async fn find_by_uploader(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<media::Model>> {
        Media::find()
            .filter(media::Column::UploadedBy.eq(user_id))
            .order_by(media::Column::UploadedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a media row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Media::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_media(id: &str, uploader: &str) -> media::Model {
        media::Model {
            id: id.to_string(),
            file_name: "photo.jpg".to_string(),
            file_kind: media::MediaKind::Image,
            file_size: 1024,
            storage_key: format!("2026/08/{uploader}/{id}.jpg"),
            url: format!("/files/2026/08/{uploader}/{id}.jpg"),
            uploaded_by: uploader.to_string(),
            uploaded_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_media() {
        let media = create_test_media("m1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[media]])
                .into_connection(),
        );

        let repo = MediaRepository::new(db);
        let found = repo.find_by_id("m1").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().file_kind, media::MediaKind::Image);
    }

    #[tokio::test]
    async fn test_find_by_uploader_returns_own_files() {
        let m1 = create_test_media("m1", "u1");
        let m2 = create_test_media("m2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2]])
                .into_connection(),
        );

        let repo = MediaRepository::new(db);
        let results = repo.find_by_uploader("u1", 20, 0).await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|m| m.uploaded_by == "u1"));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MediaRepository::new(db);
        let result = repo.delete("m1").await;

        assert!(result.is_ok());
    }
}
