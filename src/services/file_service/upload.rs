use crate::api::error::AppError;
use crate::entities::files;
use crate::services::file_registry::{FileContent, FileRegistry};
use crate::utils::mime::{detect_mime, extension};
use crate::utils::validation::{sanitize_filename, validate_file_size};
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use super::{FileService, types::UploadedFile};

impl FileService {
    /// `{prefix}/{YYYY}/{MM}/{uuid}.{ext}`
    pub fn stored_path(&self, filename: &str, now: DateTime<Utc>) -> String {
        let name = match extension(filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        format!(
            "{}/{:04}/{:02}/{}",
            self.config.path_prefix,
            now.year(),
            now.month(),
            name
        )
    }

    /// Normalizes a client upload into the fields the registry stores.
    pub(super) fn describe(&self, upload: &UploadedFile) -> Result<FileContent, AppError> {
        validate_file_size(upload.data.len(), self.config.max_file_size)?;
        let filename = sanitize_filename(&upload.filename)?;
        let mime_type = detect_mime(&upload.data, &filename, upload.content_type.as_deref());

        Ok(FileContent {
            filename,
            mime_type: Some(mime_type),
            size: upload.size(),
        })
    }

    /// Stores the bytes under a generated path, then registers the file. A
    /// failed registration removes the stored object again.
    pub async fn upload(&self, upload: UploadedFile) -> Result<files::Model, AppError> {
        let content = self.describe(&upload)?;
        let path = self.stored_path(&content.filename, Utc::now());

        let stored = self
            .storage
            .put_file(&path, upload.data)
            .await
            .map_err(|e| AppError::Internal(format!("Upload failed: {}", e)))?;

        match FileRegistry::create(&self.db, &stored, content).await {
            Ok(file) => {
                tracing::info!(
                    "Uploaded file {} ({}, {} bytes) to {}",
                    file.id,
                    file.filename,
                    file.size,
                    file.path
                );
                Ok(file)
            }
            Err(e) => {
                tracing::error!(
                    "Registering upload at {} failed, removing stored object: {}",
                    stored,
                    e
                );
                if let Err(cleanup) = self.storage.delete_file(&stored).await {
                    tracing::error!("Orphaned object left at {}: {}", stored, cleanup);
                }
                Err(e)
            }
        }
    }
}
