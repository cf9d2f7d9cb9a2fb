//! Create media table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Media::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Media::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Media::FileName).string_len(512).not_null())
                    .col(ColumnDef::new(Media::FileKind).string_len(20).not_null())
                    .col(ColumnDef::new(Media::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Media::StorageKey).string_len(1024).not_null())
                    .col(ColumnDef::new(Media::Url).string_len(1024).not_null())
                    .col(ColumnDef::new(Media::UploadedBy).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Media::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: uploaded_by (my_uploads)
        manager
            .create_index(
                Index::create()
                    .name("idx_media_uploaded_by")
                    .table(Media::Table)
                    .col(Media::UploadedBy)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Media::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
    FileName,
    FileKind,
    FileSize,
    StorageKey,
    Url,
    UploadedBy,
    UploadedAt,
}
