use anyhow::{Context, Result};
use std::env;

/// Backend that holds uploaded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageDriver {
    /// Directory on the local disk (`STORAGE_ROOT`).
    Local,
    /// S3-compatible object store (`MINIO_*`).
    S3,
}

impl StorageDriver {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "s3" | "minio" => StorageDriver::S3,
            _ => StorageDriver::Local,
        }
    }
}

/// Runtime configuration for the shelf service
#[derive(Debug, Clone)]
pub struct ShelfConfig {
    /// Maximum upload size in bytes (default: 64 MB)
    pub max_file_size: usize,

    pub storage_driver: StorageDriver,

    /// Root directory for the local driver
    pub storage_root: String,

    /// First segment of every stored path (default: "shelf")
    pub path_prefix: String,

    /// Include raw `size` and `mime_type` in file responses
    pub expose_raw_fields: bool,

    /// HS256 key for admin tokens. `from_env` refuses to start without it.
    pub jwt_secret: String,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            max_file_size: 64 * 1024 * 1024,
            storage_driver: StorageDriver::Local,
            storage_root: "storage/app/public".to_string(),
            path_prefix: "shelf".to_string(),
            expose_raw_fields: false,
            jwt_secret: String::new(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

fn flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

impl ShelfConfig {
    /// Load configuration from environment variables. `JWT_SECRET` must be
    /// set and non-empty.
    pub fn from_env() -> Result<Self> {
        let default = Self::default();
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .context("JWT_SECRET must be set")?;

        Ok(Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            storage_driver: env::var("STORAGE_DRIVER")
                .map(|v| StorageDriver::parse(&v))
                .unwrap_or(default.storage_driver),

            storage_root: env::var("STORAGE_ROOT").unwrap_or(default.storage_root),

            path_prefix: env::var("SHELF_PATH_PREFIX")
                .ok()
                .map(|v| v.trim_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default.path_prefix),

            expose_raw_fields: env::var("SHELF_EXPOSE_RAW_FIELDS")
                .map(|v| flag(&v))
                .unwrap_or(default.expose_raw_fields),

            jwt_secret,

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        })
    }
}
