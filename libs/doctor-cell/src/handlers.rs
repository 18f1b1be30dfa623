use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{clock_time, DoctorError, DoctorId, DoctorSearchQuery};
use crate::router::DoctorState;

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::NotFound(_) => AppError::NotFound(error.to_string()),
            DoctorError::CatalogUnavailable(_) => AppError::ServiceUnavailable(error.to_string()),
        }
    }
}

pub async fn search_doctors(
    State(state): State<Arc<DoctorState>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = state.directory.search(&query).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<DoctorId>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.catalog.get_doctor(doctor_id).await?;

    Ok(Json(json!({
        "doctor": doctor,
        "timing": doctor.timing.to_string()
    })))
}

pub async fn get_doctor_slots(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<DoctorId>,
) -> Result<Json<Value>, AppError> {
    let doctor = state.catalog.get_doctor(doctor_id).await?;

    let slots: Vec<String> = doctor
        .timing
        .offered_slots()
        .iter()
        .map(|t| t.format(clock_time::FORMAT).to_string())
        .collect();

    Ok(Json(json!({
        "doctor_id": doctor.id,
        "slot_minutes": doctor.timing.slot_minutes,
        "slots": slots
    })))
}

pub async fn list_specialties(
    State(state): State<Arc<DoctorState>>,
) -> Result<Json<Value>, AppError> {
    let specialties = state.directory.specialties().await?;
    Ok(Json(json!({ "specialties": specialties })))
}
