//! Create broadcast tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create broadcast table
        manager
            .create_table(
                Table::create()
                    .table(Broadcast::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Broadcast::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Broadcast::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Broadcast::Body).text().not_null())
                    .col(ColumnDef::new(Broadcast::Priority).string_len(20).not_null())
                    .col(ColumnDef::new(Broadcast::Audience).string_len(20).not_null())
                    .col(ColumnDef::new(Broadcast::StartsAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Broadcast::EndsAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Broadcast::SendEmail).boolean().not_null().default(false))
                    .col(ColumnDef::new(Broadcast::IsPublished).boolean().not_null().default(true))
                    .col(ColumnDef::new(Broadcast::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Broadcast::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Broadcast::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Broadcast::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: created_by (my_broadcasts)
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_created_by")
                    .table(Broadcast::Table)
                    .col(Broadcast::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Index: (is_active, is_published) (liveness filtering)
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_active_published")
                    .table(Broadcast::Table)
                    .col(Broadcast::IsActive)
                    .col(Broadcast::IsPublished)
                    .to_owned(),
            )
            .await?;

        // Index: created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_created_at")
                    .table(Broadcast::Table)
                    .col(Broadcast::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Create broadcast_target_group table
        manager
            .create_table(
                Table::create()
                    .table(BroadcastTargetGroup::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BroadcastTargetGroup::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(BroadcastTargetGroup::BroadcastId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastTargetGroup::GroupId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_target_group_broadcast")
                            .from(BroadcastTargetGroup::Table, BroadcastTargetGroup::BroadcastId)
                            .to(Broadcast::Table, Broadcast::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_target_group_unique")
                    .table(BroadcastTargetGroup::Table)
                    .col(BroadcastTargetGroup::BroadcastId)
                    .col(BroadcastTargetGroup::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create broadcast_target_user table
        manager
            .create_table(
                Table::create()
                    .table(BroadcastTargetUser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BroadcastTargetUser::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(BroadcastTargetUser::BroadcastId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastTargetUser::UserId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_target_user_broadcast")
                            .from(BroadcastTargetUser::Table, BroadcastTargetUser::BroadcastId)
                            .to(Broadcast::Table, Broadcast::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_target_user_unique")
                    .table(BroadcastTargetUser::Table)
                    .col(BroadcastTargetUser::BroadcastId)
                    .col(BroadcastTargetUser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create broadcast_attachment table
        manager
            .create_table(
                Table::create()
                    .table(BroadcastAttachment::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BroadcastAttachment::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(BroadcastAttachment::BroadcastId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastAttachment::MediaId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_attachment_broadcast")
                            .from(BroadcastAttachment::Table, BroadcastAttachment::BroadcastId)
                            .to(Broadcast::Table, Broadcast::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create broadcast_acknowledgment table
        manager
            .create_table(
                Table::create()
                    .table(BroadcastAcknowledgment::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BroadcastAcknowledgment::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(BroadcastAcknowledgment::BroadcastId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastAcknowledgment::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(BroadcastAcknowledgment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_acknowledgment_broadcast")
                            .from(BroadcastAcknowledgment::Table, BroadcastAcknowledgment::BroadcastId)
                            .to(Broadcast::Table, Broadcast::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (broadcast_id, user_id) - acknowledge is idempotent
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_acknowledgment_unique")
                    .table(BroadcastAcknowledgment::Table)
                    .col(BroadcastAcknowledgment::BroadcastId)
                    .col(BroadcastAcknowledgment::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create broadcast_view table
        manager
            .create_table(
                Table::create()
                    .table(BroadcastView::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BroadcastView::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(BroadcastView::BroadcastId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastView::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(BroadcastView::IpAddress).string_len(64))
                    .col(
                        ColumnDef::new(BroadcastView::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_broadcast_view_broadcast")
                            .from(BroadcastView::Table, BroadcastView::BroadcastId)
                            .to(Broadcast::Table, Broadcast::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (broadcast_id, user_id) - one view row per pair
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_view_unique")
                    .table(BroadcastView::Table)
                    .col(BroadcastView::BroadcastId)
                    .col(BroadcastView::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: viewed_at (daily bucketing)
        manager
            .create_index(
                Index::create()
                    .name("idx_broadcast_view_viewed_at")
                    .table(BroadcastView::Table)
                    .col(BroadcastView::ViewedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BroadcastView::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BroadcastAcknowledgment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BroadcastAttachment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BroadcastTargetUser::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BroadcastTargetGroup::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Broadcast::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Broadcast {
    Table,
    Id,
    Title,
    Body,
    Priority,
    Audience,
    StartsAt,
    EndsAt,
    SendEmail,
    IsPublished,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum BroadcastTargetGroup {
    Table,
    Id,
    BroadcastId,
    GroupId,
}

#[derive(Iden)]
enum BroadcastTargetUser {
    Table,
    Id,
    BroadcastId,
    UserId,
}

#[derive(Iden)]
enum BroadcastAttachment {
    Table,
    Id,
    BroadcastId,
    MediaId,
}

#[derive(Iden)]
enum BroadcastAcknowledgment {
    Table,
    Id,
    BroadcastId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum BroadcastView {
    Table,
    Id,
    BroadcastId,
    UserId,
    IpAddress,
    ViewedAt,
}
