use crate::entities::{fileables, files, metadata};
use crate::services::file_registry::{classify, format_size};
use crate::services::listing::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct MetadataResponse {
    pub id: i32,
    pub file_id: i32,
    pub key: String,
    pub value: String,
}

impl From<metadata::Model> for MetadataResponse {
    fn from(m: metadata::Model) -> Self {
        Self {
            id: m.id,
            file_id: m.file_id,
            key: m.key,
            value: m.value,
        }
    }
}

/// Ledger row a file was reached through.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct PivotResponse {
    pub file_id: i32,
    pub fileable_type: String,
    pub fileable_id: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<fileables::Model> for PivotResponse {
    fn from(p: fileables::Model) -> Self {
        Self {
            file_id: p.file_id,
            fileable_type: p.fileable_type,
            fileable_id: p.fileable_id,
            role: p.role,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Client view of a file. `type` and `formatted_size` are computed here;
/// `size` and `mime_type` only appear when raw fields are exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct FileResponse {
    pub id: i32,
    pub filename: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub formatted_size: String,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<MetadataResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot: Option<PivotResponse>,
}

impl FileResponse {
    pub fn new(file: files::Model, expose_raw: bool) -> Self {
        let file_type = classify(file.mime_type.as_deref()).to_string();
        let formatted_size = format_size(file.size);
        Self {
            id: file.id,
            filename: file.filename,
            path: file.path,
            mime_type: if expose_raw { file.mime_type } else { None },
            size: expose_raw.then_some(file.size),
            created_at: file.created_at,
            updated_at: file.updated_at,
            formatted_size,
            file_type,
            metadata: None,
            pivot: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Vec<MetadataResponse>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_pivot(mut self, pivot: fileables::Model) -> Self {
        self.pivot = Some(pivot.into());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileListResponse {
    pub data: Vec<FileResponse>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl From<Page<FileResponse>> for FileListResponse {
    fn from(page: Page<FileResponse>) -> Self {
        Self {
            data: page.data,
            total: page.total,
            per_page: page.per_page,
            current_page: page.current_page,
            last_page: page.last_page,
            from: page.from,
            to: page.to,
        }
    }
}

/// Query values arrive as strings; unparseable numbers are ignored.
#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// image | video | audio | document | archive
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    /// date | size | -size; newest first otherwise
    pub sort: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteFileRequest {
    #[schema(value_type = Option<i32>)]
    pub id: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
