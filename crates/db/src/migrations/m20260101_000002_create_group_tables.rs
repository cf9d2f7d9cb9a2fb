//! Create group, `group_member` and `group_owner` tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create group table
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Group::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Group::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Group::Description).text())
                    .col(ColumnDef::new(Group::GroupType).string_len(20).not_null())
                    .col(ColumnDef::new(Group::Department).string_len(128))
                    .col(ColumnDef::new(Group::CreatedBy).string_len(32))
                    .col(ColumnDef::new(Group::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Group::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Group::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: group_type (public-group listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_group_type")
                    .table(Group::Table)
                    .col(Group::GroupType)
                    .to_owned(),
            )
            .await?;

        // Create group_member table
        manager
            .create_table(
                Table::create()
                    .table(GroupMember::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupMember::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(GroupMember::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupMember::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupMember::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_member_group")
                            .from(GroupMember::Table, GroupMember::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_unique")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (membership lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_user_id")
                    .table(GroupMember::Table)
                    .col(GroupMember::UserId)
                    .to_owned(),
            )
            .await?;

        // Create group_owner table
        manager
            .create_table(
                Table::create()
                    .table(GroupOwner::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GroupOwner::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(GroupOwner::GroupId).string_len(32).not_null())
                    .col(ColumnDef::new(GroupOwner::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(GroupOwner::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_owner_group")
                            .from(GroupOwner::Table, GroupOwner::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_owner_unique")
                    .table(GroupOwner::Table)
                    .col(GroupOwner::GroupId)
                    .col(GroupOwner::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (ownership lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_owner_user_id")
                    .table(GroupOwner::Table)
                    .col(GroupOwner::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupOwner::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(GroupMember::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
    Name,
    Description,
    GroupType,
    Department,
    CreatedBy,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GroupMember {
    Table,
    Id,
    GroupId,
    UserId,
    JoinedAt,
}

#[derive(Iden)]
enum GroupOwner {
    Table,
    Id,
    GroupId,
    UserId,
    CreatedAt,
}
