//! Group entity for audience targeting.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Group visibility type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    /// Listed to everyone; anyone can join.
    #[sea_orm(string_value = "public")]
    Public,
    /// Visible to members, owners, and staff; join requires staff action.
    #[sea_orm(string_value = "private")]
    Private,
}

impl Default for GroupType {
    fn default() -> Self {
        Self::Public
    }
}

/// A named set of users that broadcasts and events can target.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    pub group_type: GroupType,

    /// Department the group is associated with (optional).
    #[sea_orm(nullable)]
    pub department: Option<String>,

    /// User who created the group.
    #[sea_orm(indexed, nullable)]
    pub created_by: Option<String>,

    /// Deactivated groups are hidden from listings and targeting.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,

    #[sea_orm(has_many = "super::group_owner::Entity")]
    Owners,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::group_owner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
