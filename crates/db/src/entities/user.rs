//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user of the platform. Accounts are provisioned externally; the
/// backend only resolves identity from the access token.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Email address, used for notification dispatch.
    pub email: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Access token used by the auth middleware.
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Department the user belongs to (free-form, optional).
    #[sea_orm(nullable)]
    pub department: Option<String>,

    /// Staff flag. Staff see and manage all content.
    #[sea_orm(default_value = false)]
    pub is_staff: bool,

    /// Inactive users are excluded from audiences and recipient counts.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    GroupMemberships,

    #[sea_orm(has_many = "super::broadcast::Entity")]
    Broadcasts,

    #[sea_orm(has_many = "super::event::Entity")]
    Events,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMemberships.def()
    }
}

impl Related<super::broadcast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broadcasts.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
