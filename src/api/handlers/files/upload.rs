use crate::api::error::AppError;
use crate::services::file_registry::FileRegistry;
use crate::services::file_service::UploadedFile;
use crate::utils::validation::FieldChecks;
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde_json::Value;
use std::collections::HashMap;

use super::types::*;

/// Buffered multipart body: at most one `file` part plus text fields.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    /// A `file` part that carried no filename, i.e. not a file.
    file_not_a_file: bool,
    fields: HashMap<String, String>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError, max_size: usize) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::invalid(
            "file",
            format!(
                "The file field must not be greater than {} kilobytes.",
                max_size / 1024
            ),
        )
    } else {
        tracing::debug!("Malformed multipart body: {}", err_msg);
        AppError::invalid("file", "The file failed to upload.")
    }
}

async fn read_form(multipart: &mut Multipart, max_size: usize) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let Some(filename) = field.file_name().map(|s| s.to_string()) else {
                form.file_not_a_file = true;
                continue;
            };
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, max_size))?;
            form.file = Some(UploadedFile::new(filename, content_type, data));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| multipart_error(e, max_size))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

fn require_file(form: &mut UploadForm, checks: &mut FieldChecks) -> Option<UploadedFile> {
    match form.file.take() {
        Some(file) => Some(file),
        None if form.file_not_a_file => {
            checks.push("file", "The file field must be a file.");
            None
        }
        None => {
            checks.push("file", "The file field is required.");
            None
        }
    }
}

#[utoipa::path(
    post,
    path = "/files/upload",
    request_body(content = String, description = "Multipart body with a `file` part", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Missing or invalid file")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let mut form = read_form(&mut multipart, state.config.max_file_size).await?;

    let mut checks = FieldChecks::new();
    let upload = require_file(&mut form, &mut checks);
    checks.finish()?;
    let upload = upload.ok_or_else(|| AppError::invalid("file", "The file field is required."))?;

    let file = state.file_service.upload(upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(FileResponse::new(file, state.config.expose_raw_fields)),
    ))
}

#[utoipa::path(
    post,
    path = "/files/replace",
    request_body(content = String, description = "Multipart body with `id` and `file` parts", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File replaced", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid id or file"),
        (status = 500, description = "Storage failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn replace_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<MessageResponse>, AppError> {
    let mut form = read_form(&mut multipart, state.config.max_file_size).await?;

    let mut checks = FieldChecks::new();
    let id_value = form.fields.remove("id").map(Value::String);
    let id = checks.integer("id", id_value.as_ref());
    if let Some(id) = id {
        if !FileRegistry::exists(&state.db, id).await? {
            checks.push("id", "The selected id is invalid.");
        }
    }
    let upload = require_file(&mut form, &mut checks);
    checks.finish()?;

    let (Some(id), Some(upload)) = (id, upload) else {
        return Err(AppError::invalid("file", "The file field is required."));
    };

    state.file_service.replace(id, upload).await?;

    Ok(Json(MessageResponse {
        message: "File replaced successfully.".to_string(),
    }))
}
