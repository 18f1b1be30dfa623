// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::BookingLedger;

pub struct AppointmentState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<BookingLedger>,
}

impl AppointmentState {
    pub fn new(config: Arc<AppConfig>, ledger: Arc<BookingLedger>) -> Self {
        Self { config, ledger }
    }
}

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    // Slot lookups are open so the booking form can render before sign-in
    let public_routes = Router::new()
        .route("/availability", get(handlers::get_slot_availability))
        .route("/availability/check", get(handlers::check_slot_availability));

    let protected_routes = Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
