use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{appointment_routes, AppointmentState, BookingLedger};
use auth_cell::router::auth_routes;
use doctor_cell::services::DoctorCatalog;
use doctor_cell::{doctor_routes, DoctorState};
use shared_config::AppConfig;

pub fn create_router(
    config: Arc<AppConfig>,
    catalog: Arc<dyn DoctorCatalog>,
    ledger: Arc<BookingLedger>,
) -> Router {
    let doctor_state = Arc::new(DoctorState::new(catalog));
    let appointment_state = Arc::new(AppointmentState::new(Arc::clone(&config), ledger));

    Router::new()
        .route("/", get(|| async { "MediSlot API is running!" }))
        .nest("/auth", auth_routes(config))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(appointment_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_cell::models::BookingRules;
    use appointment_cell::services::MemoryAppointmentStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use doctor_cell::services::StaticDoctorCatalog;
    use serde_json::Value;
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    async fn create_test_app() -> Router {
        let catalog: Arc<dyn DoctorCatalog> = Arc::new(StaticDoctorCatalog::builtin());
        let ledger = BookingLedger::load(
            Arc::new(MemoryAppointmentStore::new()),
            Arc::clone(&catalog),
            BookingRules::default(),
        )
        .await
        .unwrap();

        create_router(TestConfig::default().to_arc(), catalog, Arc::new(ledger))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_liveness() {
        let (status, body) = get(create_test_app().await, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"MediSlot API is running!");
    }

    #[tokio::test]
    async fn test_cells_are_nested() {
        let (status, body) = get(create_test_app().await, "/doctors/2").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["doctor"]["specialty"], "Cardiologist");

        let (status, _) = get(create_test_app().await, "/auth/session").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(create_test_app().await, "/appointments").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
