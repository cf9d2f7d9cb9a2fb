//! Broadcast view entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Records that a user has viewed a broadcast.
///
/// Doubles as the viewed-set and the append-only view log: the unique
/// (broadcast, user) constraint keeps at most one row per pair, and
/// rows are never updated or deleted while the broadcast exists.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "broadcast_view")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub broadcast_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    /// Client IP at the time of the first view, when known.
    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    pub viewed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::broadcast::Entity",
        from = "Column::BroadcastId",
        to = "super::broadcast::Column::Id",
        on_delete = "Cascade"
    )]
    Broadcast,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::broadcast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broadcast.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
