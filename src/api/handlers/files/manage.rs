use crate::api::error::AppError;
use crate::services::file_registry::FileRegistry;
use crate::utils::validation::FieldChecks;
use axum::{Json, extract::State};

use super::types::*;

#[utoipa::path(
    delete,
    path = "/files/delete",
    request_body = DeleteFileRequest,
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid id"),
        (status = 500, description = "Storage or database failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Json(req): Json<DeleteFileRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut checks = FieldChecks::new();
    let id = checks.integer("id", req.id.as_ref());
    if let Some(id) = id {
        if !FileRegistry::exists(&state.db, id).await? {
            checks.push("id", "The selected id is invalid.");
        }
    }
    checks.finish()?;
    let id = id.ok_or_else(|| AppError::invalid("id", "The id field is required."))?;

    state.file_service.delete(id).await?;

    Ok(Json(MessageResponse {
        message: "File deleted successfully.".to_string(),
    }))
}
