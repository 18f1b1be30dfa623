// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use doctor_cell::models::{clock_time, DoctorId};
use shared_config::AppConfig;
use shared_models::error::{describe_fields, FieldError};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: String,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    pub patient: PatientDetails,
    pub consultation_fee: u32,
    pub platform_fee: u32,
    pub total_fee: u32,
    pub appointment_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
        }
    }

    /// Only scheduled appointments hold their slot.
    pub fn occupies(&self, slot: &SlotKey) -> bool {
        self.status == AppointmentStatus::Scheduled && self.slot() == *slot
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// The (doctor, date, time) tuple that at most one scheduled appointment may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "doctor {} on {} at {}",
            self.doctor_id,
            self.date,
            self.time.format(clock_time::FORMAT)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender {:?}", other)),
        }
    }
}

/// Display-only details captured on the booking form, as stored once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub age: u32,
    pub gender: Gender,
    pub symptoms: String,
    pub medical_history: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Date and time arrive as form strings so a bad value can be reported per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: DoctorId,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub patient: PatientForm,
}

/// Patient fields exactly as the form posts them. Age may come as a number or
/// a string and gender as free text; both are checked by the booking validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub age: Option<Value>,
    pub gender: Option<String>,
    pub symptoms: String,
    pub medical_history: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailabilityQuery {
    pub doctor_id: DoctorId,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCheckQuery {
    pub doctor_id: DoctorId,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub available: bool,
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub platform_fee: u32,
    pub max_advance_booking_days: u32,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            platform_fee: 29,
            max_advance_booking_days: 30,
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl BookingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            platform_fee: config.platform_fee,
            max_advance_booking_days: config.max_advance_booking_days,
            clinic_utc_offset_minutes: config.clinic_utc_offset_minutes,
        }
    }

    /// The clinic's calendar date at `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        let offset = self
            .clinic_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt);

        match offset {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => {
                warn!(
                    "Clinic UTC offset of {} minutes is out of range, using UTC",
                    self.clinic_utc_offset_minutes
                );
                now.date_naive()
            }
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {}", describe_fields(.0))]
    ValidationError(Vec<FieldError>),

    #[error("Slot no longer available: {0}")]
    Conflict(SlotKey),

    #[error("Doctor {0} not found")]
    DoctorNotFound(DoctorId),

    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment belongs to another user")]
    Forbidden,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidState(AppointmentStatus),

    #[error("Appointment store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppointmentError {
    pub fn field(field: &str, message: &str) -> Self {
        AppointmentError::ValidationError(vec![FieldError::new(field, message)])
    }
}
