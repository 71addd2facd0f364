use crate::api::error::AppError;
use crate::utils::auth::validate_jwt;
use crate::{AppState, entities::prelude::Users};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

fn bearer_or_query_token(req: &Request) -> Option<String> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    auth_header.or_else(|| {
        // Try query parameter
        let query = req.uri().query().unwrap_or_default();
        serde_urlencoded::from_str::<AuthQuery>(query)
            .ok()
            .and_then(|q| q.token)
    })
}

/// Lets the request through only for a live user whose role is admin. The
/// user row is placed in the request extensions.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_or_query_token(&req)
        .ok_or_else(|| AppError::Unauthorized("missing token".to_string()))?;

    let claims = validate_jwt(&token, &state.config.jwt_secret)
        .map_err(|e| AppError::Unauthorized(format!("invalid token: {}", e)))?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized(format!("malformed subject {}", claims.sub)))?;

    let user = Users::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized(format!("user {} no longer exists", user_id)))?;

    if !user.is_admin() {
        return Err(AppError::Unauthorized(format!(
            "user {} is not an admin",
            user.id
        )));
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
