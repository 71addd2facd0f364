use crate::api::error::AppError;
use crate::entities::files;
use crate::services::file_registry::FileRegistry;
use sea_orm::TransactionTrait;

use super::{FileService, types::UploadedFile};

impl FileService {
    /// Swaps the bytes of an existing file in place. The stored path is kept;
    /// filename, mime type and size follow the new upload.
    pub async fn replace(&self, id: i32, upload: UploadedFile) -> Result<files::Model, AppError> {
        let content = self.describe(&upload)?;

        let txn = self.db.begin().await?;
        let file = FileRegistry::find(&txn, id).await?;
        let path = file.path.clone();
        let updated = FileRegistry::update_content(&txn, file, content, None).await?;

        // The put overwrites in place; a failure here drops the transaction
        // and leaves both the old bytes and the old record untouched.
        self.storage
            .put_file(&path, upload.data)
            .await
            .map_err(|e| AppError::Internal(format!("Replace failed: {}", e)))?;

        txn.commit().await.map_err(|e| {
            tracing::error!(
                "File {} bytes at {} replaced but record update failed to commit: {}",
                id,
                path,
                e
            );
            AppError::Database(e)
        })?;

        tracing::info!(
            "Replaced file {} at {} ({}, {} bytes)",
            updated.id,
            updated.path,
            updated.filename,
            updated.size
        );
        Ok(updated)
    }
}
