use crate::api::error::AppError;
use crate::api::handlers::files::{MessageResponse, MetadataResponse};
use crate::services::file_registry::FileRegistry;
use crate::services::metadata_store::MetadataStore;
use crate::utils::validation::FieldChecks;
use axum::{Json, extract::State, http::StatusCode};
use sea_orm::ConnectionTrait;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddMetadataRequest {
    #[schema(value_type = Option<i32>)]
    pub file_id: Option<Value>,
    #[validate(
        required(message = "The key field is required."),
        length(min = 1, message = "The key field is required.")
    )]
    pub key: Option<String>,
    #[validate(
        required(message = "The value field is required."),
        length(min = 1, message = "The value field is required.")
    )]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateMetadataRequest {
    #[schema(value_type = Option<i32>)]
    pub id: Option<Value>,
    #[validate(
        required(message = "The key field is required."),
        length(min = 1, message = "The key field is required.")
    )]
    pub key: Option<String>,
    #[validate(
        required(message = "The value field is required."),
        length(min = 1, message = "The value field is required.")
    )]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteMetadataRequest {
    #[schema(value_type = Option<i32>)]
    pub id: Option<Value>,
}

/// Failures after validation surface as one generic message.
fn unable(action: &str, e: AppError) -> AppError {
    tracing::error!("Metadata {} failed: {}", action, e);
    AppError::Failed(format!("Unable To {} This Metadata", action))
}

async fn existing_metadata_id(
    db: &impl ConnectionTrait,
    checks: &mut FieldChecks,
    value: Option<&Value>,
) -> Result<Option<i32>, AppError> {
    let Some(id) = checks.integer("id", value) else {
        return Ok(None);
    };
    match MetadataStore::find(db, id).await {
        Ok(_) => Ok(Some(id)),
        Err(e) if e.is_not_found() => {
            checks.push("id", "The selected id is invalid.");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    post,
    path = "/meta/add",
    request_body = AddMetadataRequest,
    responses(
        (status = 201, description = "Metadata created", body = MetadataResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failure"),
        (status = 500, description = "Unable To Add This Metadata")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "metadata"
)]
pub async fn add_metadata(
    State(state): State<crate::AppState>,
    Json(req): Json<AddMetadataRequest>,
) -> Result<(StatusCode, Json<MetadataResponse>), AppError> {
    let mut checks = FieldChecks::new();
    let file_id = checks.integer("file_id", req.file_id.as_ref());
    if let Some(file_id) = file_id {
        if !FileRegistry::exists(&state.db, file_id).await? {
            checks.push("file_id", "The selected file_id is invalid.");
        }
    }
    if let Err(e) = req.validate() {
        checks.extend(e);
    }
    checks.finish()?;

    let (Some(file_id), Some(key), Some(value)) = (file_id, req.key, req.value) else {
        return Err(AppError::invalid("file_id", "The file_id field is required."));
    };

    let meta = MetadataStore::add(&state.db, file_id, &key, &value)
        .await
        .map_err(|e| unable("Add", e))?;

    Ok((StatusCode::CREATED, Json(meta.into())))
}

#[utoipa::path(
    patch,
    path = "/meta/update",
    request_body = UpdateMetadataRequest,
    responses(
        (status = 200, description = "Metadata updated", body = MetadataResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failure"),
        (status = 500, description = "Unable To Update This Metadata")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "metadata"
)]
pub async fn update_metadata(
    State(state): State<crate::AppState>,
    Json(req): Json<UpdateMetadataRequest>,
) -> Result<Json<MetadataResponse>, AppError> {
    let mut checks = FieldChecks::new();
    let id = existing_metadata_id(&state.db, &mut checks, req.id.as_ref()).await?;
    if let Err(e) = req.validate() {
        checks.extend(e);
    }
    checks.finish()?;

    let (Some(id), Some(key), Some(value)) = (id, req.key, req.value) else {
        return Err(AppError::invalid("id", "The id field is required."));
    };

    let meta = MetadataStore::update(&state.db, id, &key, &value)
        .await
        .map_err(|e| unable("Update", e))?;

    Ok(Json(meta.into()))
}

#[utoipa::path(
    delete,
    path = "/meta/delete",
    request_body = DeleteMetadataRequest,
    responses(
        (status = 200, description = "Metadata deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Validation failure"),
        (status = 500, description = "Unable To Delete This Metadata")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "metadata"
)]
pub async fn delete_metadata(
    State(state): State<crate::AppState>,
    Json(req): Json<DeleteMetadataRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut checks = FieldChecks::new();
    let id = existing_metadata_id(&state.db, &mut checks, req.id.as_ref()).await?;
    checks.finish()?;
    let id = id.ok_or_else(|| AppError::invalid("id", "The id field is required."))?;

    let deleted = MetadataStore::delete(&state.db, id)
        .await
        .map_err(|e| unable("Delete", e))?;
    if !deleted {
        return Err(unable(
            "Delete",
            AppError::Internal(format!("metadata {} was not removed", id)),
        ));
    }

    Ok(Json(MessageResponse {
        message: "Metadata Deleted Successfully".to_string(),
    }))
}
