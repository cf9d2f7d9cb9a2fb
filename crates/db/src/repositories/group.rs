//! Group repository.

use std::sync::Arc;

use bullhorn_common::{AppError, AppResult, IdGenerator};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::{
    Group, GroupMember, GroupOwner, group, group_member, group_owner,
};

/// Repository for group and membership operations.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db, id_gen: IdGenerator::new() }
    }

    /// Create a new group.
    pub async fn create(
        &self,
        id: String,
        name: String,
        description: Option<String>,
        group_type: group::GroupType,
        department: Option<String>,
        created_by: Option<String>,
    ) -> AppResult<group::Model> {
        let active_model = group::ActiveModel {
            id: Set(id),
            name: Set(name),
            description: Set(description),
            group_type: Set(group_type),
            department: Set(department),
            created_by: Set(created_by),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        active_model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find group by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find groups by IDs (active only).
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<group::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Group::find()
            .filter(group::Column::Id.is_in(ids.iter().cloned()))
            .filter(group::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all active groups (staff view).
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<group::Model>> {
        Group::find()
            .filter(group::Column::IsActive.eq(true))
            .order_by(group::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List active groups visible to a non-staff user: public groups
    /// plus the given (member/owner) group IDs plus groups they created.
    pub async fn find_visible(
        &self,
        user_id: &str,
        related_ids: &[String],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<group::Model>> {
        let mut cond = Condition::any()
            .add(group::Column::GroupType.eq(group::GroupType::Public))
            .add(group::Column::CreatedBy.eq(user_id));

        if !related_ids.is_empty() {
            cond = cond.add(group::Column::Id.is_in(related_ids.iter().cloned()));
        }

        Group::find()
            .filter(group::Column::IsActive.eq(true))
            .filter(cond)
            .order_by(group::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a group.
    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<Option<String>>,
        group_type: Option<group::GroupType>,
        department: Option<Option<String>>,
    ) -> AppResult<group::Model> {
        let existing = Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {id}")))?;

        let mut active: group::ActiveModel = existing.into();

        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(group_type) = group_type {
            active.group_type = Set(group_type);
        }
        if let Some(department) = department {
            active.department = Set(department);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Soft-delete a group.
    pub async fn soft_delete(&self, id: &str) -> AppResult<()> {
        let existing = Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {id}")))?;

        let mut active: group::ActiveModel = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // === Membership ===

    /// Add a user to a group. Returns false if they were already a
    /// member.
    pub async fn add_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let active_model = group_member::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            joined_at: Set(Utc::now().into()),
        };

        let result = GroupMember::insert(active_model)
            .on_conflict(
                OnConflict::columns([group_member::Column::GroupId, group_member::Column::UserId])
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

    /// Remove a user from a group. Idempotent.
    pub async fn remove_member(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        GroupMember::delete_many()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Check group membership.
    pub async fn is_member(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let row = GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .filter(group_member::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// IDs of groups a user belongs to.
    pub async fn group_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        GroupMember::find()
            .select_only()
            .column(group_member::Column::GroupId)
            .filter(group_member::Column::UserId.eq(user_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Distinct user IDs across the given groups.
    pub async fn member_user_ids(&self, group_ids: &[String]) -> AppResult<Vec<String>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        GroupMember::find()
            .select_only()
            .column(group_member::Column::UserId)
            .distinct()
            .filter(group_member::Column::GroupId.is_in(group_ids.iter().cloned()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Member count of a group.
    pub async fn member_count(&self, group_id: &str) -> AppResult<u64> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Ownership ===

    /// Add an owner to a group. Returns false if already an owner.
    pub async fn add_owner(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let active_model = group_owner::ActiveModel {
            id: Set(self.id_gen.generate()),
            group_id: Set(group_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let result = GroupOwner::insert(active_model)
            .on_conflict(
                OnConflict::columns([group_owner::Column::GroupId, group_owner::Column::UserId])
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

    /// Remove an owner from a group. Idempotent.
    pub async fn remove_owner(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        GroupOwner::delete_many()
            .filter(group_owner::Column::GroupId.eq(group_id))
            .filter(group_owner::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Check group ownership.
    pub async fn is_owner(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let row = GroupOwner::find()
            .filter(group_owner::Column::GroupId.eq(group_id))
            .filter(group_owner::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.is_some())
    }

    /// IDs of groups a user owns.
    pub async fn owned_group_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        GroupOwner::find()
            .select_only()
            .column(group_owner::Column::GroupId)
            .filter(group_owner::Column::UserId.eq(user_id))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_group(id: &str, group_type: group::GroupType) -> group::Model {
        group::Model {
            id: id.to_string(),
            name: format!("Group {id}"),
            description: None,
            group_type,
            department: None,
            created_by: Some("u1".to_string()),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_group() {
        let group = create_test_group("g1", group::GroupType::Public);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group]])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let found = repo.find_by_id("g1").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().id, "g1");
    }

    #[tokio::test]
    async fn test_is_member_false_when_no_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<group_member::Model>::new()])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let member = repo.is_member("g1", "u1").await.unwrap();

        assert!(!member);
    }

    #[tokio::test]
    async fn test_remove_member_is_idempotent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.remove_member("g1", "u1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_member_user_ids_empty_groups() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let repo = GroupRepository::new(db);
        let ids = repo.member_user_ids(&[]).await.unwrap();

        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_marks_inactive() {
        let group = create_test_group("g1", group::GroupType::Public);
        let mut deleted = group.clone();
        deleted.is_active = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[group]])
                .append_query_results([[deleted]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = GroupRepository::new(db);
        let result = repo.soft_delete("g1").await;

        assert!(result.is_ok());
    }
}
