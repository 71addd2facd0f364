use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One uploaded binary artifact. `type` and `formatted_size` are derived at
/// the serialization boundary and never stored.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Original client name, display only
    pub filename: String,
    /// Storage-relative locator
    #[sea_orm(unique)]
    pub path: String,
    pub mime_type: Option<String>,
    pub size: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::metadata::Entity")]
    Metadata,
    #[sea_orm(has_many = "super::fileables::Entity")]
    Fileables,
}

impl Related<super::metadata::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Metadata.def()
    }
}

impl Related<super::fileables::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fileables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
    }

    pub fn is_video(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("video/"))
    }
}
