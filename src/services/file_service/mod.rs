use crate::config::ShelfConfig;
use crate::services::storage::StorageService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod delete;
pub mod replace;
pub mod types;
pub mod upload;

pub use types::UploadedFile;

/// Coordinates registry mutations with the storage collaborator.
///
/// No locks are taken: two concurrent replaces of one file both succeed and
/// the last writer's bytes and fields win.
pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: ShelfConfig,
}

impl FileService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        config: ShelfConfig,
    ) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }
}
