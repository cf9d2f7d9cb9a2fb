//! Media service.

use std::sync::Arc;

use tracing::warn;

use bullhorn_common::{
    AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key,
};
use bullhorn_db::entities::{media, user};
use bullhorn_db::repositories::MediaRepository;

/// Service for media uploads.
#[derive(Clone)]
pub struct MediaService {
    media_repo: MediaRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(media_repo: MediaRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self { media_repo, storage, id_gen: IdGenerator::new() }
    }

    /// Upload a file. The kind is derived from the extension; files
    /// outside the allow-list are rejected before any bytes are
    /// stored.
    pub async fn upload(
        &self,
        uploader: &user::Model,
        file_name: &str,
        data: &[u8],
    ) -> AppResult<media::Model> {
        let extension = file_name
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() < file_name.len())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let Some(kind) = media::MediaKind::from_extension(&extension) else {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {file_name}"
            )));
        };

        let key = generate_storage_key(&uploader.id, file_name);
        let uploaded = self.storage.upload(&key, data).await?;

        self.media_repo
            .create(
                self.id_gen.generate(),
                file_name.to_string(),
                kind,
                uploaded.size as i64,
                uploaded.key,
                uploaded.url,
                uploader.id.clone(),
            )
            .await
    }

    /// Get a media row. Visible to the uploader and staff only.
    pub async fn get(&self, viewer: &user::Model, id: &str) -> AppResult<media::Model> {
        let model = self
            .media_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found: {id}")))?;

        if model.uploaded_by != viewer.id && !viewer.is_staff {
            return Err(AppError::NotFound(format!("Media not found: {id}")));
        }

        Ok(model)
    }

    /// List uploads: everything for staff, the viewer's own
    /// otherwise.
    pub async fn list(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<media::Model>> {
        if viewer.is_staff {
            self.media_repo.find_all(limit, offset).await
        } else {
            self.media_repo.find_by_uploader(&viewer.id, limit, offset).await
        }
    }

    /// The viewer's own uploads.
    pub async fn my_uploads(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<media::Model>> {
        self.media_repo.find_by_uploader(&viewer.id, limit, offset).await
    }

    /// Delete an upload. Uploader or staff only; the metadata row
    /// goes even when the backing file cannot be removed.
    pub async fn delete(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        let model = self.get(viewer, id).await?;

        if let Err(e) = self.storage.delete(&model.storage_key).await {
            warn!(media_id = %id, error = %e, "Failed to delete stored file");
        }

        self.media_repo.delete(id).await
    }

    /// Hydrate media rows for a set of IDs (attachments).
    pub async fn by_ids(&self, ids: &[String]) -> AppResult<Vec<media::Model>> {
        self.media_repo.find_by_ids(ids).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    struct MemoryStorage;

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(&self, key: &str, data: &[u8]) -> AppResult<bullhorn_common::UploadedFile> {
            Ok(bullhorn_common::UploadedFile {
                key: key.to_string(),
                url: format!("/files/{key}"),
                size: data.len() as u64,
            })
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("/files/{key}")
        }

        async fn exists(&self, _key: &str) -> AppResult<bool> {
            Ok(true)
        }
    }

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

    fn make_media(id: &str, uploader: &str) -> media::Model {
        media::Model {
            id: id.to_string(),
            file_name: "photo.jpg".to_string(),
            file_kind: media::MediaKind::Image,
            file_size: 3,
            storage_key: "k".to_string(),
            url: "/files/k".to_string(),
            uploaded_by: uploader.to_string(),
            uploaded_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_extension() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = MediaService::new(MediaRepository::new(db), Arc::new(MemoryStorage));
        let uploader = make_user("u1", false);

        let result = svc.upload(&uploader, "malware.exe", b"abc").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_upload_derives_kind_from_extension() {
        let stored = make_media("m1", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = MediaService::new(MediaRepository::new(db), Arc::new(MemoryStorage));
        let uploader = make_user("u1", false);

        let model = svc.upload(&uploader, "photo.JPG", b"abc").await.unwrap();

        assert_eq!(model.file_kind, media::MediaKind::Image);
    }

    #[tokio::test]
    async fn test_get_other_users_file_is_not_found() {
        let stored = make_media("m1", "owner");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .into_connection(),
        );
        let svc = MediaService::new(MediaRepository::new(db), Arc::new(MemoryStorage));
        let viewer = make_user("u1", false);

        let result = svc.get(&viewer, "m1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_staff_can_get_any_file() {
        let stored = make_media("m1", "owner");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .into_connection(),
        );
        let svc = MediaService::new(MediaRepository::new(db), Arc::new(MemoryStorage));
        let staff = make_user("admin", true);

        let result = svc.get(&staff, "m1").await;

        assert!(result.is_ok());
    }
}
