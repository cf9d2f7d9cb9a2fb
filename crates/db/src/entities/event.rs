//! Event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Internal company event.
    #[sea_orm(string_value = "internal")]
    Internal,
    /// Event open to external attendees.
    #[sea_orm(string_value = "external")]
    External,
}

impl Default for EventType {
    fn default() -> Self {
        Self::Internal
    }
}

/// A scheduled event users can RSVP to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub body: String,

    pub event_type: EventType,

    /// When the event takes place. Must be in the future at creation;
    /// RSVPs close once it passes.
    pub starts_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub venue: Option<String>,

    /// Free-form theme/styling payload.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub theme: Option<serde_json::Value>,

    #[sea_orm(default_value = false)]
    pub is_important: bool,

    /// Public events are visible to every active user regardless of
    /// the visible-group/visible-user sets.
    #[sea_orm(default_value = false)]
    pub is_public: bool,

    /// Soft-delete flag.
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

    #[sea_orm(has_many = "super::event_visible_group::Entity")]
    VisibleGroups,

    #[sea_orm(has_many = "super::event_visible_user::Entity")]
    VisibleUsers,

    #[sea_orm(has_many = "super::event_media::Entity")]
    Media,

    #[sea_orm(has_many = "super::event_rsvp::Entity")]
    Rsvps,

    #[sea_orm(has_many = "super::event_rsvp_log::Entity")]
    RsvpLogs,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::event_rsvp::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rsvps.def()
    }
}

impl Related<super::event_rsvp_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RsvpLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
