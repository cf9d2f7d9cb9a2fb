//! User repository.

use std::sync::Arc;

use bullhorn_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

use crate::entities::{User, user};

/// Repository for user lookups.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an active user by access token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .filter(user::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count active users. Used as the recipient count for
    /// audience=all broadcasts and public events.
    pub async fn count_active(&self) -> AppResult<u64> {
        User::find()
            .filter(user::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Email addresses of all active users.
    pub async fn active_emails(&self) -> AppResult<Vec<String>> {
        User::find()
            .select_only()
            .column(user::Column::Email)
            .filter(user::Column::IsActive.eq(true))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Email addresses of the given active users.
    pub async fn emails_for_ids(&self, ids: &[String]) -> AppResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        User::find()
            .select_only()
            .column(user::Column::Email)
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .filter(user::Column::IsActive.eq(true))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, is_staff: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            email: format!("{id}@example.com"),
            name: None,
            token: Some(format!("token_{id}")),
            department: None,
            is_staff,
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_token_returns_user() {
        let user = create_test_user("u1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("token_u1").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_find_by_token_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_token("bogus").await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_count_active() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(42))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let count = repo.count_active().await.unwrap();

        assert_eq!(count, 42);
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = UserRepository::new(db);
        let users = repo.find_by_ids(&[]).await.unwrap();

        assert!(users.is_empty());
    }
}
