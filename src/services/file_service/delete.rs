use crate::api::error::AppError;
use crate::entities::files;
use crate::services::file_registry::FileRegistry;
use sea_orm::TransactionTrait;

use super::FileService;

impl FileService {
    /// Removes the record (with its metadata and attachments) and its stored
    /// bytes. The database side is staged first and only committed once the
    /// storage delete succeeded, so a storage failure leaves the record intact.
    pub async fn delete(&self, id: i32) -> Result<files::Model, AppError> {
        let txn = self.db.begin().await?;

        let file = FileRegistry::delete(&txn, id).await?;

        if let Err(e) = self.storage.delete_file(&file.path).await {
            tracing::error!(
                "Storage delete failed for file {} at {}, rolling back: {}",
                id,
                file.path,
                e
            );
            txn.rollback().await?;
            return Err(AppError::Internal(format!("Delete failed: {}", e)));
        }

        if let Err(e) = txn.commit().await {
            tracing::error!(
                "File {}: stored bytes at {} deleted but record removal failed to commit: {}",
                id,
                file.path,
                e
            );
            return Err(AppError::Database(e));
        }

        tracing::info!("Deleted file {} ({}) at {}", file.id, file.filename, file.path);
        Ok(file)
    }
}
