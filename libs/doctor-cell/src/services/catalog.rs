use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::debug;

use crate::models::{Doctor, DoctorError, DoctorId, TimingWindow};

pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Read-only doctor lookups. Booking only ever needs `get_doctor`.
#[async_trait]
pub trait DoctorCatalog: Send + Sync {
    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Doctor, DoctorError>;

    async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError>;
}

pub struct StaticDoctorCatalog {
    doctors: Vec<Doctor>,
}

impl StaticDoctorCatalog {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }

    /// The clinic's published directory.
    pub fn builtin() -> Self {
        Self::new(builtin_doctors())
    }
}

impl Default for StaticDoctorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl DoctorCatalog for StaticDoctorCatalog {
    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Doctor, DoctorError> {
        debug!("Looking up doctor {}", doctor_id);

        self.doctors
            .iter()
            .find(|d| d.id == doctor_id)
            .cloned()
            .ok_or(DoctorError::NotFound(doctor_id))
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.doctors.clone())
    }
}

fn hours(open: u32, close: u32) -> TimingWindow {
    TimingWindow::new(
        NaiveTime::from_hms_opt(open, 0, 0).unwrap_or(NaiveTime::MIN),
        NaiveTime::from_hms_opt(close, 0, 0).unwrap_or(NaiveTime::MIN),
        DEFAULT_SLOT_MINUTES,
    )
}

#[allow(clippy::too_many_arguments)]
fn doctor(
    id: DoctorId,
    name: &str,
    specialty: &str,
    qualification: &str,
    location: &str,
    phone: &str,
    email: &str,
    timing: TimingWindow,
    fee: u32,
    rating: f32,
    experience_years: u32,
) -> Doctor {
    Doctor {
        id,
        name: name.to_string(),
        specialty: specialty.to_string(),
        qualification: qualification.to_string(),
        location: location.to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        timing,
        fee,
        rating,
        experience_years,
    }
}

fn builtin_doctors() -> Vec<Doctor> {
    vec![
        doctor(1, "Dr. Ananya Sharma", "Dermatologist", "MBBS (AIMS Delhi), PG",
               "123, Shashtri Nagar", "+91 12345 67890", "ananya.sharma@medislot.com",
               hours(10, 17), 199, 4.8, 8),
        doctor(2, "Dr. Rajesh Kumar", "Cardiologist", "MBBS, MD (Cardiology)",
               "456, Medical Center", "+91 98765 43210", "rajesh.kumar@medislot.com",
               hours(9, 18), 299, 4.9, 12),
        doctor(3, "Dr. Priya Patel", "Gynecologist", "MBBS, MS (Gynecology)",
               "789, Women's Clinic", "+91 87654 32109", "priya.patel@medislot.com",
               hours(10, 16), 249, 4.7, 10),
        doctor(4, "Dr. Amit Singh", "General Physician", "MBBS, MD (Internal Medicine)",
               "321, Health Center", "+91 76543 21098", "amit.singh@medislot.com",
               hours(8, 20), 149, 4.6, 15),
        doctor(5, "Dr. Sunita Verma", "Pediatrician", "MBBS, MD (Pediatrics)",
               "654, Children's Hospital", "+91 65432 10987", "sunita.verma@medislot.com",
               hours(9, 17), 179, 4.8, 9),
        doctor(6, "Dr. Vikram Joshi", "Neurologist", "MBBS, DM (Neurology)",
               "987, Neuro Center", "+91 54321 09876", "vikram.joshi@medislot.com",
               hours(10, 15), 399, 4.9, 14),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_builtin_catalog_lookup() {
        let catalog = StaticDoctorCatalog::builtin();

        let doctor = catalog.get_doctor(2).await.unwrap();
        assert_eq!(doctor.name, "Dr. Rajesh Kumar");
        assert_eq!(doctor.fee, 299);
        assert_eq!(doctor.timing.to_string(), "9:00 AM to 6:00 PM");

        assert_eq!(catalog.list_doctors().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_doctor() {
        let catalog = StaticDoctorCatalog::builtin();
        assert_matches!(catalog.get_doctor(42).await, Err(DoctorError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_builtin_hours_offer_half_hour_slots() {
        let catalog = StaticDoctorCatalog::builtin();
        let neurologist = catalog.get_doctor(6).await.unwrap();

        // 10:00 to 15:00 in 30 minute slots
        let slots = neurologist.timing.offered_slots();
        assert_eq!(slots.len(), 10);
        assert_eq!(slots.first().map(|t| t.format("%H:%M").to_string()), Some("10:00".to_string()));
        assert_eq!(slots.last().map(|t| t.format("%H:%M").to_string()), Some("14:30".to_string()));
    }
}
