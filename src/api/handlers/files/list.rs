use crate::api::error::AppError;
use crate::services::listing::{FileListing, ListFilters, SortOrder, TypeFilter};
use crate::services::metadata_store::MetadataStore;
use axum::{
    Json,
    extract::{Query, State},
};
use std::collections::HashMap;

use super::types::*;

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl From<&ListFilesQuery> for ListFilters {
    fn from(query: &ListFilesQuery) -> Self {
        Self {
            file_type: filled(&query.file_type).and_then(TypeFilter::parse),
            year: filled(&query.year).and_then(|v| v.parse().ok()),
            month: filled(&query.month).and_then(|v| v.parse().ok()),
            search: filled(&query.search).map(str::to_string),
            sort: SortOrder::parse(filled(&query.sort)),
            page: filled(&query.page)
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
        }
    }
}

#[utoipa::path(
    get,
    path = "/files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Paginated files", body = FileListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<FileListResponse>, AppError> {
    let filters = ListFilters::from(&query);
    let page = FileListing::list(&state.db, &filters).await?;

    let ids: Vec<i32> = page.data.iter().map(|f| f.id).collect();
    let mut metadata: HashMap<i32, Vec<MetadataResponse>> = HashMap::new();
    for row in MetadataStore::for_files(&state.db, ids).await? {
        metadata.entry(row.file_id).or_default().push(row.into());
    }

    let expose_raw = state.config.expose_raw_fields;
    let page = page.map(|file| {
        let meta = metadata.remove(&file.id).unwrap_or_default();
        FileResponse::new(file, expose_raw).with_metadata(meta)
    });

    Ok(Json(page.into()))
}
