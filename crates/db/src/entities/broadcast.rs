//! Broadcast entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Broadcast priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum BroadcastPriority {
    #[sea_orm(string_value = "important")]
    Important,
    #[sea_orm(string_value = "normal")]
    Normal,
}

impl Default for BroadcastPriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Who a broadcast is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum BroadcastAudience {
    /// Every active user.
    #[sea_orm(string_value = "all")]
    All,
    /// Members of the target groups.
    #[sea_orm(string_value = "groups")]
    Groups,
    /// The target users directly.
    #[sea_orm(string_value = "users")]
    Users,
}

impl Default for BroadcastAudience {
    fn default() -> Self {
        Self::All
    }
}

/// A time-windowed announcement addressed to an audience.
///
/// A broadcast is live when the current time falls in
/// `[starts_at, ends_at)` and it is both published and active.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "broadcast")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub priority: BroadcastPriority,

    pub audience: BroadcastAudience,

    pub starts_at: DateTimeWithTimeZone,

    pub ends_at: DateTimeWithTimeZone,

    /// Whether to queue email notifications on publish.
    #[sea_orm(default_value = false)]
    pub send_email: bool,

    #[sea_orm(default_value = true)]
    pub is_published: bool,

    /// Soft-delete flag. Deactivated broadcasts stay referenced by
    /// view logs.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    #[sea_orm(indexed)]
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    Creator,

    #[sea_orm(has_many = "super::broadcast_target_group::Entity")]
    TargetGroups,

    #[sea_orm(has_many = "super::broadcast_target_user::Entity")]
    TargetUsers,

    #[sea_orm(has_many = "super::broadcast_attachment::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::broadcast_acknowledgment::Entity")]
    Acknowledgments,

    #[sea_orm(has_many = "super::broadcast_view::Entity")]
    Views,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::broadcast_acknowledgment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Acknowledgments.def()
    }
}

impl Related<super::broadcast_view::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Views.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
