//! Event RSVP log entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::event_rsvp::RsvpStatus;

/// Append-only record of RSVP transitions.
///
/// `old_status` is NULL for a user's first response to an event. Rows
/// are never updated or deleted; they exist for analytics.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_rsvp_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub event_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    #[sea_orm(nullable)]
    pub old_status: Option<RsvpStatus>,

    pub new_status: RsvpStatus,

    pub changed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
