use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/session", get(handlers::current_session))
        .route("/validate", post(handlers::validate_token))
        .with_state(state)
}
