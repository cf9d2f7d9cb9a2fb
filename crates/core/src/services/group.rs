//! Group service.

use bullhorn_common::{AppError, AppResult, IdGenerator};
use bullhorn_db::entities::{group, user};
use bullhorn_db::repositories::GroupRepository;

/// Input for updating a group. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub group_type: Option<group::GroupType>,
    pub department: Option<Option<String>>,
}

/// Service for group and membership operations.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository) -> Self {
        Self { group_repo, id_gen: IdGenerator::new() }
    }

    /// Create a group.
    pub async fn create(
        &self,
        creator: &user::Model,
        name: String,
        description: Option<String>,
        group_type: group::GroupType,
        department: Option<String>,
    ) -> AppResult<group::Model> {
        self.group_repo
            .create(
                self.id_gen.generate(),
                name,
                description,
                group_type,
                department,
                Some(creator.id.clone()),
            )
            .await
    }

    /// Get a group the viewer is allowed to see.
    ///
    /// Private groups are visible only to members, owners, the
    /// creator, and staff; for everyone else they do not exist.
    pub async fn get(&self, viewer: &user::Model, id: &str) -> AppResult<group::Model> {
        let model = self.load_visible(viewer, id).await?;
        Ok(model)
    }

    /// List groups the viewer can see: all for staff, otherwise
    /// public groups plus the viewer's own.
    pub async fn list(
        &self,
        viewer: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<group::Model>> {
        if viewer.is_staff {
            return self.group_repo.find_all(limit, offset).await;
        }

        let mut related = self.group_repo.group_ids_for_user(&viewer.id).await?;
        related.extend(self.group_repo.owned_group_ids(&viewer.id).await?);

        self.group_repo
            .find_visible(&viewer.id, &related, limit, offset)
            .await
    }

    /// Groups the viewer belongs to.
    pub async fn my_groups(&self, viewer: &user::Model) -> AppResult<Vec<group::Model>> {
        let ids = self.group_repo.group_ids_for_user(&viewer.id).await?;
        self.group_repo.find_by_ids(&ids).await
    }

    /// Update a group. Owners, the creator, and staff may update.
    pub async fn update(
        &self,
        viewer: &user::Model,
        id: &str,
        input: UpdateGroup,
    ) -> AppResult<group::Model> {
        let existing = self.load_visible(viewer, id).await?;
        self.require_manage(viewer, &existing).await?;

        self.group_repo
            .update(id, input.name, input.description, input.group_type, input.department)
            .await
    }

    /// Soft-delete a group. Owners, the creator, and staff may
    /// delete.
    pub async fn delete(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        let existing = self.load_visible(viewer, id).await?;
        self.require_manage(viewer, &existing).await?;

        self.group_repo.soft_delete(id).await
    }

    /// Join a group. Only public groups accept self-service joins;
    /// the operation is idempotent.
    pub async fn join(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        let model = self.load_visible(viewer, id).await?;

        if model.group_type != group::GroupType::Public {
            return Err(AppError::Forbidden(
                "Private groups cannot be joined directly".to_string(),
            ));
        }

        self.group_repo.add_member(id, &viewer.id).await?;
        Ok(())
    }

    /// Leave a group. Idempotent.
    pub async fn leave(&self, viewer: &user::Model, id: &str) -> AppResult<()> {
        // Visibility check first so leaving cannot probe hidden groups.
        self.load_visible(viewer, id).await?;
        self.group_repo.remove_member(id, &viewer.id).await
    }

    /// Add an owner. Owners, the creator, and staff may manage
    /// owners; ownership is independent of membership.
    pub async fn add_owner(&self, viewer: &user::Model, id: &str, user_id: &str) -> AppResult<()> {
        let existing = self.load_visible(viewer, id).await?;
        self.require_manage(viewer, &existing).await?;

        self.group_repo.add_owner(id, user_id).await?;
        Ok(())
    }

    /// Remove an owner. Idempotent.
    pub async fn remove_owner(
        &self,
        viewer: &user::Model,
        id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let existing = self.load_visible(viewer, id).await?;
        self.require_manage(viewer, &existing).await?;

        self.group_repo.remove_owner(id, user_id).await
    }

    /// Member count for a group the viewer can see.
    pub async fn member_count(&self, viewer: &user::Model, id: &str) -> AppResult<u64> {
        self.load_visible(viewer, id).await?;
        self.group_repo.member_count(id).await
    }

    async fn require_manage(&self, viewer: &user::Model, group: &group::Model) -> AppResult<()> {
        if viewer.is_staff
            || group.created_by.as_deref() == Some(viewer.id.as_str())
            || self.group_repo.is_owner(&group.id, &viewer.id).await?
        {
            return Ok(());
        }

        Err(AppError::Forbidden(
            "Only owners, the creator, or staff may manage a group".to_string(),
        ))
    }

    /// Load a group, collapsing missing, inactive and hidden to
    /// not-found.
    async fn load_visible(&self, viewer: &user::Model, id: &str) -> AppResult<group::Model> {
        let model = self
            .group_repo
            .find_by_id(id)
            .await?
            .filter(|g| g.is_active)
            .ok_or_else(|| AppError::NotFound(format!("Group not found: {id}")))?;

        if model.group_type == group::GroupType::Public
            || viewer.is_staff
            || model.created_by.as_deref() == Some(viewer.id.as_str())
        {
            return Ok(model);
        }

        if self.group_repo.is_member(id, &viewer.id).await?
            || self.group_repo.is_owner(id, &viewer.id).await?
        {
            return Ok(model);
        }

        Err(AppError::NotFound(format!("Group not found: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    use bullhorn_db::entities::group_member;

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

    fn make_group(id: &str, group_type: group::GroupType) -> group::Model {
        group::Model {
            id: id.to_string(),
            name: format!("Group {id}"),
            description: None,
            group_type,
            department: None,
            created_by: Some("creator".to_string()),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_join_public_group() {
        let public = make_group("g1", group::GroupType::Public);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[public]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let svc = GroupService::new(GroupRepository::new(db));
        let viewer = make_user("u1", false);

        let result = svc.join(&viewer, "g1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_join_private_group_as_member_is_forbidden() {
        // A member can see the private group but still cannot
        // self-service join it.
        let private = make_group("g1", group::GroupType::Private);
        let membership = group_member::Model {
            id: "gm1".to_string(),
            group_id: "g1".to_string(),
            user_id: "u1".to_string(),
            joined_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[private]])
                .append_query_results([[membership]])
                .into_connection(),
        );
        let svc = GroupService::new(GroupRepository::new(db));
        let viewer = make_user("u1", false);

        let result = svc.join(&viewer, "g1").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_private_group_hidden_from_outsider() {
        let private = make_group("g1", group::GroupType::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[private]])
                // not a member, not an owner
                .append_query_results([Vec::<group_member::Model>::new()])
                .append_query_results([Vec::<bullhorn_db::entities::group_owner::Model>::new()])
                .into_connection(),
        );
        let svc = GroupService::new(GroupRepository::new(db));
        let viewer = make_user("u1", false);

        let result = svc.get(&viewer, "g1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_private_group_visible_to_staff() {
        let private = make_group("g1", group::GroupType::Private);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[private]])
                .into_connection(),
        );
        let svc = GroupService::new(GroupRepository::new(db));
        let staff = make_user("admin", true);

        let result = svc.get(&staff, "g1").await;

        assert!(result.is_ok());
    }
}
