#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_user_table;
mod m20260101_000002_create_group_tables;
mod m20260101_000003_create_media_table;
mod m20260101_000004_create_broadcast_tables;
mod m20260101_000005_create_event_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_user_table::Migration),
            Box::new(m20260101_000002_create_group_tables::Migration),
            Box::new(m20260101_000003_create_media_table::Migration),
            Box::new(m20260101_000004_create_broadcast_tables::Migration),
            Box::new(m20260101_000005_create_event_tables::Migration),
        ]
    }
}
