// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::{AppError, FieldError};

use crate::models::{
    AppointmentError, BookAppointmentRequest, SlotAvailabilityQuery, SlotCheckQuery,
};
use crate::router::AppointmentState;
use crate::services::validation::{parse_date, parse_time};

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::ValidationError(fields) => AppError::ValidationError(fields),
            AppointmentError::Conflict(_) => {
                AppError::Conflict("Appointment slot no longer available".to_string())
            }
            AppointmentError::DoctorNotFound(_) | AppointmentError::NotFound => {
                AppError::NotFound(error.to_string())
            }
            AppointmentError::Forbidden => {
                AppError::Forbidden("Not authorized to access this appointment".to_string())
            }
            AppointmentError::InvalidState(_) => AppError::Conflict(error.to_string()),
            AppointmentError::StoreUnavailable(_) => {
                AppError::ServiceUnavailable("Appointment storage is temporarily unavailable".to_string())
            }
        }
    }
}

// ==============================================================================
// PUBLIC AVAILABILITY HANDLERS
// ==============================================================================

pub async fn get_slot_availability(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<SlotAvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date).map_err(|e| AppError::ValidationError(vec![e]))?;
    let slots = state.ledger.slot_availability(query.doctor_id, date).await?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": date,
        "slots": slots
    })))
}

pub async fn check_slot_availability(
    State(state): State<Arc<AppointmentState>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let mut fields = Vec::new();
    let date = parse_date(&query.date).map_err(|e| fields.push(e)).ok();
    let time = parse_time(&query.time).map_err(|e| fields.push(e)).ok();

    let (Some(date), Some(time)) = (date, time) else {
        return Err(AppError::ValidationError(fields));
    };

    let available = state.ledger.is_slot_available(query.doctor_id, date, time).await;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "date": date,
        "time": query.time.trim(),
        "available": available
    })))
}

// ==============================================================================
// AUTHENTICATED APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    payload: Result<Json<BookAppointmentRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(request) = payload.map_err(body_error)?;
    let appointment = state.ledger.book_appointment(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.ledger.list_appointments(&user.id).await;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = if user.is_staff() {
        state.ledger.find_appointment(appointment_id).await?
    } else {
        state.ledger.get_appointment(appointment_id, &user.id).await?
    };

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.ledger.cancel_appointment(appointment_id, &user.id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

pub async fn complete_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden(
            "Only doctors and admins can complete appointments".to_string(),
        ));
    }

    let appointment = state.ledger.complete_appointment(appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment marked as completed"
    })))
}

/// Bodies that do not fit the request shape get the same 422 envelope as field errors.
fn body_error(rejection: JsonRejection) -> AppError {
    debug!("Rejected booking body: {}", rejection.body_text());
    AppError::ValidationError(vec![FieldError::new("body", rejection.body_text())])
}
