pub mod attachments;
pub mod file_registry;
pub mod file_service;
pub mod listing;
pub mod metadata_store;
pub mod storage;
