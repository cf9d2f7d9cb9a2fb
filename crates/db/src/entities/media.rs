//! Media entity for uploaded files.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of an uploaded file, derived from its extension at upload time
/// and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "pdf")]
    Pdf,
    #[sea_orm(string_value = "document")]
    Document,
}

impl MediaKind {
    /// Derive the kind from a lowercase file extension.
    ///
    /// Returns `None` for extensions outside the upload allow-list.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" => Some(Self::Image),
            "mp4" | "avi" | "mov" => Some(Self::Video),
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" | "txt" => Some(Self::Document),
            _ => None,
        }
    }
}

/// An uploaded file. The bytes live in the storage backend; this row
/// holds the metadata.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Original file name as uploaded.
    pub file_name: String,

    pub file_kind: MediaKind,

    /// File size in bytes.
    pub file_size: i64,

    /// Key under the storage backend root.
    pub storage_key: String,

    /// Public URL to access the file.
    pub url: String,

    #[sea_orm(indexed)]
    pub uploaded_by: String,

    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UploadedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Uploader,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("jpeg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mov"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("pdf"), Some(MediaKind::Pdf));
        assert_eq!(MediaKind::from_extension("docx"), Some(MediaKind::Document));
        assert_eq!(MediaKind::from_extension("exe"), None);
        assert_eq!(MediaKind::from_extension(""), None);
    }
}
