use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::services::file_registry::FileRegistry;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// Key/value annotations scoped to one file. Keys may repeat per file; reads
/// by key resolve to the oldest row.
pub struct MetadataStore;

impl MetadataStore {
    pub async fn add(
        db: &impl ConnectionTrait,
        file_id: i32,
        key: &str,
        value: &str,
    ) -> Result<metadata::Model, AppError> {
        if !FileRegistry::exists(db, file_id).await? {
            return Err(AppError::NotFound(format!("File {} not found", file_id)));
        }

        let now = Utc::now();
        let row = metadata::ActiveModel {
            file_id: Set(file_id),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(row.insert(db).await?)
    }

    pub async fn update(
        db: &impl ConnectionTrait,
        id: i32,
        key: &str,
        value: &str,
    ) -> Result<metadata::Model, AppError> {
        let row = Self::find(db, id).await?;

        let mut active = row.into_active_model();
        active.key = Set(key.to_string());
        active.value = Set(value.to_string());
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    pub async fn delete(db: &impl ConnectionTrait, id: i32) -> Result<bool, AppError> {
        let row = Self::find(db, id).await?;
        let res = row.delete(db).await?;
        Ok(res.rows_affected > 0)
    }

    pub async fn find(db: &impl ConnectionTrait, id: i32) -> Result<metadata::Model, AppError> {
        Metadata::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Metadata {} not found", id)))
    }

    pub async fn for_file(
        db: &impl ConnectionTrait,
        file_id: i32,
    ) -> Result<Vec<metadata::Model>, AppError> {
        Ok(Metadata::find()
            .filter(metadata::Column::FileId.eq(file_id))
            .order_by_asc(metadata::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn for_files(
        db: &impl ConnectionTrait,
        file_ids: Vec<i32>,
    ) -> Result<Vec<metadata::Model>, AppError> {
        if file_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Metadata::find()
            .filter(metadata::Column::FileId.is_in(file_ids))
            .order_by_asc(metadata::Column::Id)
            .all(db)
            .await?)
    }

    pub async fn get_by_key(
        db: &impl ConnectionTrait,
        file_id: i32,
        key: &str,
    ) -> Result<Option<String>, AppError> {
        let value = Metadata::find()
            .select_only()
            .column(metadata::Column::Value)
            .filter(metadata::Column::FileId.eq(file_id))
            .filter(metadata::Column::Key.eq(key))
            .order_by_asc(metadata::Column::Id)
            .into_tuple::<String>()
            .one(db)
            .await?;
        Ok(value)
    }

    pub async fn values_for_key(
        db: &impl ConnectionTrait,
        file_id: i32,
        key: &str,
    ) -> Result<Vec<String>, AppError> {
        Ok(Metadata::find()
            .select_only()
            .column(metadata::Column::Value)
            .filter(metadata::Column::FileId.eq(file_id))
            .filter(metadata::Column::Key.eq(key))
            .order_by_asc(metadata::Column::Id)
            .into_tuple::<String>()
            .all(db)
            .await?)
    }

    pub async fn has_key(
        db: &impl ConnectionTrait,
        file_id: i32,
        key: &str,
    ) -> Result<bool, AppError> {
        let count = Metadata::find()
            .filter(metadata::Column::FileId.eq(file_id))
            .filter(metadata::Column::Key.eq(key))
            .count(db)
            .await?;
        Ok(count > 0)
    }
}
