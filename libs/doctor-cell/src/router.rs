use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use crate::handlers;
use crate::services::{DirectoryService, DoctorCatalog};

pub struct DoctorState {
    pub catalog: Arc<dyn DoctorCatalog>,
    pub directory: DirectoryService,
}

impl DoctorState {
    pub fn new(catalog: Arc<dyn DoctorCatalog>) -> Self {
        Self {
            directory: DirectoryService::new(Arc::clone(&catalog)),
            catalog,
        }
    }
}

/// The directory is public reference data; nothing here needs a session.
pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", get(handlers::search_doctors))
        .route("/specialties", get(handlers::list_specialties))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/slots", get(handlers::get_doctor_slots))
        .with_state(state)
}
