use crate::services::attachments::AttachableKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment ledger row: one role-tagged link between a file and an
/// attachable entity, addressed by `(fileable_type, fileable_id)`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fileables")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub file_id: i32,
    pub fileable_type: String,
    pub fileable_id: i32,
    pub role: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::files::Entity",
        from = "Column::FileId",
        to = "super::files::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Files,
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display name of the entity kind, e.g. "Post". `None` for tags written
    /// by something other than this service.
    pub fn entity_kind(&self) -> Option<&'static str> {
        self.fileable_type
            .parse::<AttachableKind>()
            .ok()
            .map(AttachableKind::display_name)
    }
}
