use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::Identity;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Pulls the raw token out of an `Authorization: Bearer ...` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(auth_header) = headers.get("Authorization") else {
        return Ok(None);
    };

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    match auth_value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

/// Who is calling. A request without credentials is anonymous; a request
/// with bad credentials is an error rather than silently anonymous.
pub fn resolve_identity(headers: &HeaderMap, config: &AppConfig) -> Result<Identity, AppError> {
    match extract_bearer_token(headers)? {
        None => Ok(Identity::Anonymous),
        Some(token) => validate_token(&token, &config.supabase_jwt_secret)
            .map(Identity::User)
            .map_err(AppError::Auth),
    }
}

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = match resolve_identity(request.headers(), &config)? {
        Identity::User(user) => user,
        Identity::Anonymous => {
            return Err(AppError::Auth("Missing authorization header".to_string()));
        }
    };

    tracing::debug!("Authenticated request for user {}", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;
    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let config = TestConfig::default().to_app_config();
        let identity = resolve_identity(&HeaderMap::new(), &config).unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[test]
    fn test_valid_token_resolves_user() {
        let config = TestConfig::default().to_app_config();
        let user = TestUser::patient("ravi@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(2));

        let identity = resolve_identity(&headers_with(&format!("Bearer {}", token)), &config).unwrap();
        assert_eq!(identity.user().map(|u| u.id.as_str()), Some(user.id.as_str()));
    }

    #[test]
    fn test_bad_credentials_are_errors() {
        let config = TestConfig::default().to_app_config();
        assert_matches!(
            resolve_identity(&headers_with("Token abc"), &config),
            Err(AppError::Auth(_))
        );
        assert_matches!(
            resolve_identity(&headers_with("Bearer not.a.jwt"), &config),
            Err(AppError::Auth(_))
        );
    }
}
