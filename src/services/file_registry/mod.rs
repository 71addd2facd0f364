use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};

pub mod category;
pub mod size;

pub use category::{FileCategory, classify};
pub use size::format_size;

/// Content fields written on create and rewritten on replace.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub filename: String,
    pub mime_type: Option<String>,
    pub size: i64,
}

/// Owner of canonical file records.
pub struct FileRegistry;

impl FileRegistry {
    pub async fn find(db: &impl ConnectionTrait, id: i32) -> Result<files::Model, AppError> {
        Files::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    pub async fn exists(db: &impl ConnectionTrait, id: i32) -> Result<bool, AppError> {
        Ok(Files::find_by_id(id).one(db).await?.is_some())
    }

    pub async fn create(
        db: &impl ConnectionTrait,
        path: &str,
        content: FileContent,
    ) -> Result<files::Model, AppError> {
        let now = Utc::now();
        let file = files::ActiveModel {
            filename: Set(content.filename),
            path: Set(path.to_string()),
            mime_type: Set(content.mime_type),
            size: Set(content.size.max(0)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let file = file.insert(db).await?;
        tracing::debug!("Registered file {} at {}", file.id, file.path);
        Ok(file)
    }

    /// Rewrites the content fields of `file`; the path changes only when one
    /// is supplied.
    pub async fn update_content(
        db: &impl ConnectionTrait,
        file: files::Model,
        content: FileContent,
        path: Option<String>,
    ) -> Result<files::Model, AppError> {
        let mut active = file.into_active_model();
        active.filename = Set(content.filename);
        active.mime_type = Set(content.mime_type);
        active.size = Set(content.size.max(0));
        if let Some(path) = path {
            active.path = Set(path);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// Removes the file with its metadata and ledger rows.
    ///
    /// The foreign keys cascade on PostgreSQL; SQLite only honours them when
    /// the pragma is on, so dependants are removed explicitly in the same
    /// transaction.
    pub async fn delete<C>(db: &C, id: i32) -> Result<files::Model, AppError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let txn = db.begin().await?;

        let file = Files::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;

        let metadata_rows = Metadata::delete_many()
            .filter(metadata::Column::FileId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        let ledger_rows = Fileables::delete_many()
            .filter(fileables::Column::FileId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        file.clone().delete(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            "Deleted file {} ({} metadata rows, {} attachments)",
            id,
            metadata_rows,
            ledger_rows
        );
        Ok(file)
    }
}
