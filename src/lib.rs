pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::ShelfConfig;
use crate::services::file_service::FileService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::list::list_files,
        api::handlers::files::upload::upload_file,
        api::handlers::files::upload::replace_file,
        api::handlers::files::manage::delete_file,
        api::handlers::fileables::list_fileables,
        api::handlers::fileables::attach_file,
        api::handlers::fileables::detach_file,
        api::handlers::metadata::add_metadata,
        api::handlers::metadata::update_metadata,
        api::handlers::metadata::delete_metadata,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::FileResponse,
            api::handlers::files::FileListResponse,
            api::handlers::files::MetadataResponse,
            api::handlers::files::PivotResponse,
            api::handlers::files::DeleteFileRequest,
            api::handlers::files::MessageResponse,
            api::handlers::fileables::AttachRequest,
            api::handlers::fileables::FileablesResponse,
            api::handlers::fileables::AttachmentData,
            api::handlers::fileables::AttachmentResponse,
            api::handlers::metadata::AddMetadataRequest,
            api::handlers::metadata::UpdateMetadataRequest,
            api::handlers::metadata::DeleteMetadataRequest,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "files", description = "File registry endpoints"),
        (name = "fileables", description = "Attachment ledger endpoints"),
        (name = "metadata", description = "Per-file key/value metadata"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub file_service: Arc<FileService>,
    pub config: ShelfConfig,
}

fn cors_layer(config: &ShelfConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

pub fn create_app(state: AppState) -> Router {
    // Every shelf operation sits behind the admin gate
    let shelf = Router::new()
        .route("/files", get(api::handlers::files::list_files))
        .route("/files/upload", post(api::handlers::files::upload_file))
        .route("/files/replace", post(api::handlers::files::replace_file))
        .route("/files/delete", delete(api::handlers::files::delete_file))
        .route(
            "/fileables",
            get(api::handlers::fileables::list_fileables),
        )
        .route(
            "/fileables/attach",
            post(api::handlers::fileables::attach_file),
        )
        .route(
            "/fileables/detach",
            delete(api::handlers::fileables::detach_file),
        )
        .route("/meta/add", post(api::handlers::metadata::add_metadata))
        .route(
            "/meta/update",
            patch(api::handlers::metadata::update_metadata),
        )
        .route(
            "/meta/delete",
            delete(api::handlers::metadata::delete_metadata),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::admin::admin_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .merge(shelf)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
        ))
        .with_state(state)
}
