use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::HeaderMap,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{Identity, TokenResponse};
use shared_models::error::AppError;
use shared_utils::extractor::{extract_bearer_token, resolve_identity};
use shared_utils::jwt;

/// Who is calling. No header is a valid anonymous session; a bad token is not.
pub async fn current_session(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let identity = resolve_identity(&headers, &config)?;

    let authenticated = matches!(identity, Identity::User(_));
    debug!("Resolved session (authenticated: {})", authenticated);

    Ok(Json(json!({
        "authenticated": authenticated,
        "identity": identity
    })))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let user = jwt::validate_token(&token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}
