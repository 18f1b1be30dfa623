// =====================================================================================
// BOOKING VALIDATION - DATE WINDOW, OFFERED SLOTS & PATIENT DETAILS
// =====================================================================================

use chrono::{Duration, NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};

use doctor_cell::models::{clock_time, Doctor};
use shared_models::error::FieldError;

use crate::models::{
    AppointmentError, BookAppointmentRequest, BookingRules, Gender, PatientDetails, PatientForm,
};

const REQUIRED: &str = "This field is required";
const INVALID_AGE: &str = "Please enter a valid age (1-120)";
const INVALID_GENDER: &str = "Please select male, female or other";
const MIN_AGE: i64 = 1;
const MAX_AGE: i64 = 120;

/// A booking request that passed every field check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub patient: PatientDetails,
}

pub struct BookingValidator {
    max_advance_days: i64,
    email_pattern: Regex,
    phone_pattern: Regex,
    phone_separators: Regex,
}

impl BookingValidator {
    pub fn new(rules: &BookingRules) -> Self {
        Self {
            max_advance_days: i64::from(rules.max_advance_booking_days),
            email_pattern: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"),
            phone_pattern: Regex::new(r"^\+?[1-9]\d{0,15}$").expect("phone pattern compiles"),
            phone_separators: Regex::new(r"[\s\-()]").expect("separator pattern compiles"),
        }
    }

    /// Checks a booking request against the doctor's schedule, the clinic's
    /// date window and the patient form. Every failing field is reported.
    #[instrument(skip(self, request, doctor), fields(doctor_id = doctor.id))]
    pub fn validate_booking(
        &self,
        request: &BookAppointmentRequest,
        doctor: &Doctor,
        today: NaiveDate,
    ) -> Result<ValidatedBooking, AppointmentError> {
        let mut errors = Vec::new();

        let date = match parse_date(&request.date) {
            Ok(date) => {
                if let Some(error) = self.check_date_window(date, today) {
                    errors.push(error);
                }
                Some(date)
            }
            Err(error) => {
                errors.push(error);
                None
            }
        };

        let time = match parse_time(&request.time) {
            Ok(time) if doctor.offers_slot(time) => Some(time),
            Ok(_) => {
                errors.push(FieldError::new("time", "Selected time is not offered by this doctor"));
                None
            }
            Err(error) => {
                errors.push(error);
                None
            }
        };

        let patient = self
            .validate_patient(&request.patient)
            .map_err(|patient_errors| errors.extend(patient_errors))
            .ok();

        match (date, time, patient) {
            (Some(date), Some(time), Some(patient)) if errors.is_empty() => {
                Ok(ValidatedBooking { date, time, patient })
            }
            _ => {
                debug!("Booking request rejected with {} field error(s)", errors.len());
                Err(AppointmentError::ValidationError(errors))
            }
        }
    }

    /// Bookable dates run from tomorrow through `today + max_advance_days`.
    pub fn check_date_window(&self, date: NaiveDate, today: NaiveDate) -> Option<FieldError> {
        if date <= today {
            return Some(FieldError::new("date", "Appointment date must be after today"));
        }

        if date > today + Duration::days(self.max_advance_days) {
            return Some(FieldError::new(
                "date",
                format!("Appointment date must be within {} days", self.max_advance_days),
            ));
        }

        None
    }

    pub fn validate_patient(&self, form: &PatientForm) -> Result<PatientDetails, Vec<FieldError>> {
        let mut errors = Vec::new();

        if form.name.trim().is_empty() {
            errors.push(FieldError::new("patient.name", REQUIRED));
        }

        if form.phone.trim().is_empty() {
            errors.push(FieldError::new("patient.phone", REQUIRED));
        } else if !self.is_valid_phone(&form.phone) {
            errors.push(FieldError::new("patient.phone", "Please enter a valid phone number"));
        }

        if form.email.trim().is_empty() {
            errors.push(FieldError::new("patient.email", REQUIRED));
        } else if !self.email_pattern.is_match(form.email.trim()) {
            errors.push(FieldError::new("patient.email", "Please enter a valid email address"));
        }

        let age = parse_age(form.age.as_ref())
            .map_err(|message| errors.push(FieldError::new("patient.age", message)))
            .ok();

        let gender = parse_gender(form.gender.as_deref())
            .map_err(|message| errors.push(FieldError::new("patient.gender", message)))
            .ok();

        if form.symptoms.trim().is_empty() {
            errors.push(FieldError::new("patient.symptoms", REQUIRED));
        }

        match (age, gender) {
            (Some(age), Some(gender)) if errors.is_empty() => Ok(PatientDetails {
                name: form.name.trim().to_string(),
                phone: form.phone.trim().to_string(),
                email: form.email.trim().to_string(),
                age,
                gender,
                symptoms: form.symptoms.trim().to_string(),
                medical_history: form
                    .medical_history
                    .as_deref()
                    .map(str::trim)
                    .filter(|history| !history.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(errors),
        }
    }

    pub fn is_valid_phone(&self, phone: &str) -> bool {
        let digits = self.phone_separators.replace_all(phone.trim(), "");
        self.phone_pattern.is_match(&digits)
    }
}

/// Forms post age as a number or as the text of the input box.
fn parse_age(value: Option<&Value>) -> Result<u32, &'static str> {
    let age = match value {
        None | Some(Value::Null) => return Err(REQUIRED),
        Some(Value::String(text)) if text.trim().is_empty() => return Err(REQUIRED),
        Some(Value::String(text)) => text.trim().parse::<i64>().map_err(|_| INVALID_AGE)?,
        Some(Value::Number(number)) => number.as_i64().ok_or(INVALID_AGE)?,
        Some(_) => return Err(INVALID_AGE),
    };

    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(INVALID_AGE);
    }
    u32::try_from(age).map_err(|_| INVALID_AGE)
}

fn parse_gender(value: Option<&str>) -> Result<Gender, &'static str> {
    match value.map(str::trim) {
        None | Some("") => Err(REQUIRED),
        Some(text) => text.parse().map_err(|_| INVALID_GENDER),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| FieldError::new("date", "Please enter a valid date (YYYY-MM-DD)"))
}

pub fn parse_time(value: &str) -> Result<NaiveTime, FieldError> {
    clock_time::parse(value.trim())
        .map_err(|_| FieldError::new("time", "Please enter a valid time (HH:MM)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use doctor_cell::services::{DoctorCatalog, StaticDoctorCatalog};
    use serde_json::json;

    fn validator() -> BookingValidator {
        BookingValidator::new(&BookingRules::default())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn patient() -> PatientForm {
        PatientForm {
            name: "Asha Rao".to_string(),
            phone: "+91 98765-43210".to_string(),
            email: "asha@example.com".to_string(),
            age: Some(json!(34)),
            gender: Some("female".to_string()),
            symptoms: "Skin rash".to_string(),
            medical_history: Some("   ".to_string()),
        }
    }

    fn request(date: &str, time: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: 1,
            date: date.to_string(),
            time: time.to_string(),
            patient: patient(),
        }
    }

    async fn doctor() -> Doctor {
        StaticDoctorCatalog::builtin().get_doctor(1).await.unwrap()
    }

    fn fields(error: AppointmentError) -> Vec<String> {
        match error {
            AppointmentError::ValidationError(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_request_returns_parsed_booking() {
        let booking = validator()
            .validate_booking(&request("2025-03-10", "10:00"), &doctor().await, today())
            .unwrap();

        assert_eq!(booking.date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(booking.time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(booking.patient.age, 34);
        assert_eq!(booking.patient.gender, Gender::Female);
        assert_eq!(booking.patient.medical_history, None);
    }

    #[test]
    fn test_date_window_bounds() {
        let v = validator();
        let today = today();

        assert!(v.check_date_window(today, today).is_some());
        assert!(v.check_date_window(today - Duration::days(1), today).is_some());
        assert!(v.check_date_window(today + Duration::days(1), today).is_none());
        assert!(v.check_date_window(today + Duration::days(30), today).is_none());
        assert!(v.check_date_window(today + Duration::days(31), today).is_some());
    }

    #[tokio::test]
    async fn test_unoffered_and_malformed_slots() {
        let doctor = doctor().await;

        // Dr. Sharma closes at 17:00, so 17:00 itself is not a slot
        let error = validator()
            .validate_booking(&request("2025-03-10", "17:00"), &doctor, today())
            .unwrap_err();
        assert_eq!(fields(error), vec!["time"]);

        let error = validator()
            .validate_booking(&request("10/03/2025", "ten"), &doctor, today())
            .unwrap_err();
        assert_eq!(fields(error), vec!["date", "time"]);
    }

    #[tokio::test]
    async fn test_every_bad_patient_field_is_reported() {
        let mut bad = request("2025-03-10", "10:00");
        bad.patient = PatientForm {
            phone: "0123".to_string(),
            email: "not-an-email".to_string(),
            age: Some(json!(0)),
            ..PatientForm::default()
        };

        let error = validator().validate_booking(&bad, &doctor().await, today()).unwrap_err();
        assert_eq!(
            fields(error),
            vec![
                "patient.name",
                "patient.phone",
                "patient.email",
                "patient.age",
                "patient.gender",
                "patient.symptoms",
            ]
        );
    }

    #[test]
    fn test_phone_formats() {
        let v = validator();
        assert!(v.is_valid_phone("9876543210"));
        assert!(v.is_valid_phone("+1 (555) 010-2000"));
        assert!(!v.is_valid_phone("0987654321"));
        assert!(!v.is_valid_phone("12345678901234567"));
        assert!(!v.is_valid_phone("98765abc"));
    }

    #[test]
    fn test_age_accepts_numbers_and_form_text() {
        assert_eq!(parse_age(Some(&json!(120))), Ok(120));
        assert_eq!(parse_age(Some(&json!("27"))), Ok(27));
        assert_eq!(parse_age(Some(&json!(" 1 "))), Ok(1));

        assert_eq!(parse_age(Some(&json!(121))), Err(INVALID_AGE));
        assert_eq!(parse_age(Some(&json!(-5))), Err(INVALID_AGE));
        assert_eq!(parse_age(Some(&json!("-5"))), Err(INVALID_AGE));
        assert_eq!(parse_age(Some(&json!(27.5))), Err(INVALID_AGE));
        assert_eq!(parse_age(Some(&json!("twenty"))), Err(INVALID_AGE));
        assert_eq!(parse_age(Some(&json!([27]))), Err(INVALID_AGE));

        assert_eq!(parse_age(None), Err(REQUIRED));
        assert_eq!(parse_age(Some(&Value::Null)), Err(REQUIRED));
        assert_eq!(parse_age(Some(&json!(""))), Err(REQUIRED));
    }

    #[test]
    fn test_gender_choices() {
        assert_eq!(parse_gender(Some("Male")), Ok(Gender::Male));
        assert_eq!(parse_gender(Some(" other ")), Ok(Gender::Other));
        assert_eq!(parse_gender(Some("unknown")), Err(INVALID_GENDER));
        assert_eq!(parse_gender(Some("")), Err(REQUIRED));
        assert_eq!(parse_gender(None), Err(REQUIRED));
    }

    #[test]
    fn test_out_of_range_age_is_the_only_error() {
        let mut form = patient();
        form.age = Some(json!(121));

        let errors = validator().validate_patient(&form).unwrap_err();
        assert_matches!(
            errors.as_slice(),
            [error] if error.field == "patient.age" && error.message == INVALID_AGE
        );
    }
}
