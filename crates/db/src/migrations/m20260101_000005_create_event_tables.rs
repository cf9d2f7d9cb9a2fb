//! Create event tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create event table
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Event::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Event::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Event::Body).text().not_null())
                    .col(ColumnDef::new(Event::EventType).string_len(20).not_null())
                    .col(ColumnDef::new(Event::StartsAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Event::Venue).string_len(512))
                    .col(ColumnDef::new(Event::Theme).json_binary())
                    .col(ColumnDef::new(Event::IsImportant).boolean().not_null().default(false))
                    .col(ColumnDef::new(Event::IsPublic).boolean().not_null().default(false))
                    .col(ColumnDef::new(Event::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Event::CreatedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: starts_at (upcoming listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_starts_at")
                    .table(Event::Table)
                    .col(Event::StartsAt)
                    .to_owned(),
            )
            .await?;

        // Index: created_by
        manager
            .create_index(
                Index::create()
                    .name("idx_event_created_by")
                    .table(Event::Table)
                    .col(Event::CreatedBy)
                    .to_owned(),
            )
            .await?;

        // Create event_visible_group table
        manager
            .create_table(
                Table::create()
                    .table(EventVisibleGroup::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventVisibleGroup::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(EventVisibleGroup::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventVisibleGroup::GroupId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_visible_group_event")
                            .from(EventVisibleGroup::Table, EventVisibleGroup::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_visible_group_unique")
                    .table(EventVisibleGroup::Table)
                    .col(EventVisibleGroup::EventId)
                    .col(EventVisibleGroup::GroupId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create event_visible_user table
        manager
            .create_table(
                Table::create()
                    .table(EventVisibleUser::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventVisibleUser::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(EventVisibleUser::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventVisibleUser::UserId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_visible_user_event")
                            .from(EventVisibleUser::Table, EventVisibleUser::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_visible_user_unique")
                    .table(EventVisibleUser::Table)
                    .col(EventVisibleUser::EventId)
                    .col(EventVisibleUser::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create event_media table
        manager
            .create_table(
                Table::create()
                    .table(EventMedia::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventMedia::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(EventMedia::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventMedia::MediaId).string_len(32).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_media_event")
                            .from(EventMedia::Table, EventMedia::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create event_rsvp table
        manager
            .create_table(
                Table::create()
                    .table(EventRsvp::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventRsvp::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(EventRsvp::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventRsvp::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(EventRsvp::Status).string_len(10).not_null())
                    .col(
                        ColumnDef::new(EventRsvp::RespondedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_rsvp_event")
                            .from(EventRsvp::Table, EventRsvp::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (event_id, user_id) - one status per user per event
        manager
            .create_index(
                Index::create()
                    .name("idx_event_rsvp_unique")
                    .table(EventRsvp::Table)
                    .col(EventRsvp::EventId)
                    .col(EventRsvp::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (my_events)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_rsvp_user_id")
                    .table(EventRsvp::Table)
                    .col(EventRsvp::UserId)
                    .to_owned(),
            )
            .await?;

        // Create event_rsvp_log table
        manager
            .create_table(
                Table::create()
                    .table(EventRsvpLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EventRsvpLog::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(EventRsvpLog::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(EventRsvpLog::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(EventRsvpLog::OldStatus).string_len(10))
                    .col(ColumnDef::new(EventRsvpLog::NewStatus).string_len(10).not_null())
                    .col(
                        ColumnDef::new(EventRsvpLog::ChangedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_rsvp_log_event")
                            .from(EventRsvpLog::Table, EventRsvpLog::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (event_id, changed_at) (daily bucketing)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_rsvp_log_event_changed")
                    .table(EventRsvpLog::Table)
                    .col(EventRsvpLog::EventId)
                    .col(EventRsvpLog::ChangedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventRsvpLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventRsvp::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventMedia::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventVisibleUser::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EventVisibleGroup::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    Title,
    Body,
    EventType,
    StartsAt,
    Venue,
    Theme,
    IsImportant,
    IsPublic,
    IsActive,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum EventVisibleGroup {
    Table,
    Id,
    EventId,
    GroupId,
}

#[derive(Iden)]
enum EventVisibleUser {
    Table,
    Id,
    EventId,
    UserId,
}

#[derive(Iden)]
enum EventMedia {
    Table,
    Id,
    EventId,
    MediaId,
}

#[derive(Iden)]
enum EventRsvp {
    Table,
    Id,
    EventId,
    UserId,
    Status,
    RespondedAt,
}

#[derive(Iden)]
enum EventRsvpLog {
    Table,
    Id,
    EventId,
    UserId,
    OldStatus,
    NewStatus,
    ChangedAt,
}
