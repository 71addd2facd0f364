use crate::api::error::AppError;
use crate::api::handlers::files::FileResponse;
use crate::services::attachments::{AttachableKind, AttachableRef, AttachmentLedger};
use crate::services::file_registry::FileRegistry;
use crate::utils::validation::FieldChecks;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

pub const NOT_ATTACHED: &str = "File was not attached or already detached.";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FileablesQuery {
    /// Entity kind tag, e.g. "post"
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
    pub role: Option<String>,
}

/// Body of attach and detach. On detach a missing role means every role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub id: Option<Value>,
    #[schema(value_type = Option<i32>)]
    pub file_id: Option<Value>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileablesResponse {
    pub success: bool,
    pub data: Vec<FileResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentData {
    pub file_id: i32,
    pub fileable_type: String,
    pub fileable_id: i32,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponse {
    pub success: bool,
    pub message: String,
    pub data: AttachmentData,
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Maps `(type, id)` onto a known attachable kind and checks the instance
/// exists.
async fn resolve_target(
    db: &impl ConnectionTrait,
    kind: &str,
    id: i32,
) -> Result<AttachableRef, AppError> {
    let parsed: AttachableKind = kind
        .parse()
        .map_err(|e: crate::services::attachments::UnknownKind| {
            AppError::invalid("type", e.to_string())
        })?;

    if !parsed.exists(db, id).await? {
        return Err(AppError::invalid(
            "id",
            format!("{} with id {} not found.", kind, id),
        ));
    }

    Ok(AttachableRef::new(parsed, id))
}

/// Checks `file_id` is an integer naming a live file.
async fn existing_file_id(
    db: &impl ConnectionTrait,
    checks: &mut FieldChecks,
    value: Option<&Value>,
) -> Result<Option<i32>, AppError> {
    let Some(file_id) = checks.integer("file_id", value) else {
        return Ok(None);
    };
    if !FileRegistry::exists(db, file_id).await? {
        checks.push("file_id", "The selected file_id is invalid.");
        return Ok(None);
    }
    Ok(Some(file_id))
}

#[utoipa::path(
    get,
    path = "/fileables",
    params(FileablesQuery),
    responses(
        (status = 200, description = "Files attached to the entity", body = FileablesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Invalid type or id")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "fileables"
)]
pub async fn list_fileables(
    State(state): State<crate::AppState>,
    Query(query): Query<FileablesQuery>,
) -> Result<Json<FileablesResponse>, AppError> {
    let mut checks = FieldChecks::new();
    let kind = checks.string("type", query.kind.as_deref());
    let id_value = query.id.map(Value::String);
    let id = checks.integer("id", id_value.as_ref());
    checks.finish()?;

    let (Some(kind), Some(id)) = (kind, id) else {
        return Err(AppError::invalid("type", "The type field is required."));
    };
    let target = resolve_target(&state.db, &kind, id).await?;
    let role = optional(query.role.as_deref());

    let entries = AttachmentLedger::entries(&state.db, target, role.as_deref()).await?;
    let expose_raw = state.config.expose_raw_fields;
    let data = entries
        .into_iter()
        .map(|(pivot, file)| FileResponse::new(file, expose_raw).with_pivot(pivot))
        .collect();

    Ok(Json(FileablesResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    post,
    path = "/fileables/attach",
    request_body = AttachRequest,
    responses(
        (status = 201, description = "File attached", body = AttachmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Already attached with the same role"),
        (status = 422, description = "Validation failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "fileables"
)]
pub async fn attach_file(
    State(state): State<crate::AppState>,
    Json(req): Json<AttachRequest>,
) -> Result<(StatusCode, Json<AttachmentResponse>), AppError> {
    let mut checks = FieldChecks::new();
    let kind = checks.string("type", req.kind.as_deref());
    let id = checks.integer("id", req.id.as_ref());
    let file_id = existing_file_id(&state.db, &mut checks, req.file_id.as_ref()).await?;
    let role = checks.string("role", req.role.as_deref());
    checks.finish()?;

    let (Some(kind), Some(id), Some(file_id), Some(role)) = (kind, id, file_id, role) else {
        return Err(AppError::invalid("type", "The type field is required."));
    };
    let target = resolve_target(&state.db, &kind, id).await?;

    AttachmentLedger::attach(&state.db, target, file_id, &role).await?;
    tracing::info!("Attached file {} to {} as '{}'", file_id, target, role);

    Ok((
        StatusCode::CREATED,
        Json(AttachmentResponse {
            success: true,
            message: "File attached successfully.".to_string(),
            data: AttachmentData {
                file_id,
                fileable_type: kind,
                fileable_id: id,
                role,
            },
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/fileables/detach",
    request_body = AttachRequest,
    responses(
        (status = 200, description = "File detached", body = AttachmentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File was not attached"),
        (status = 422, description = "Validation failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "fileables"
)]
pub async fn detach_file(
    State(state): State<crate::AppState>,
    Json(req): Json<AttachRequest>,
) -> Result<Json<AttachmentResponse>, AppError> {
    let mut checks = FieldChecks::new();
    let kind = checks.string("type", req.kind.as_deref());
    let id = checks.integer("id", req.id.as_ref());
    let file_id = existing_file_id(&state.db, &mut checks, req.file_id.as_ref()).await?;
    checks.finish()?;

    let (Some(kind), Some(id), Some(file_id)) = (kind, id, file_id) else {
        return Err(AppError::invalid("type", "The type field is required."));
    };
    let target = resolve_target(&state.db, &kind, id).await?;
    let role = optional(req.role.as_deref());

    let detached = AttachmentLedger::detach(&state.db, target, file_id, role.as_deref()).await?;
    if !detached {
        return Err(AppError::NotFound(NOT_ATTACHED.to_string()));
    }

    Ok(Json(AttachmentResponse {
        success: true,
        message: "File detached successfully.".to_string(),
        data: AttachmentData {
            file_id,
            fileable_type: kind,
            fileable_id: id,
            role: role.unwrap_or_else(|| "all".to_string()),
        },
    }))
}
