use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// First `limit` characters of the body, with "..." appended when cut.
    pub fn excerpt(&self, limit: usize) -> String {
        if self.body.chars().count() <= limit {
            return self.body.clone();
        }
        let cut: String = self.body.chars().take(limit).collect();
        format!("{}...", cut.trim_end())
    }
}
