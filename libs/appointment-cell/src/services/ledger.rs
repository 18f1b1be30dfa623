// libs/appointment-cell/src/services/ledger.rs
//
// The single authority over the appointment collection. Every mutation runs
// check, persist and commit under the write lock, so two bookings for the same
// slot are serialized and the loser observes a conflict. Mutations are applied
// to a copy that replaces the collection only once the store accepts it, so a
// failed or abandoned save leaves nothing behind.
//

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::models::{Doctor, DoctorError, DoctorId};
use doctor_cell::services::DoctorCatalog;
use shared_database::DatabaseError;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest, BookingRules,
    SlotAvailability, SlotKey,
};
use crate::services::clock::{Clock, SystemClock};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::numbering::generate_appointment_number;
use crate::services::pricing::PricingService;
use crate::services::store::AppointmentStore;
use crate::services::validation::{BookingValidator, ValidatedBooking};

pub struct BookingLedger {
    appointments: RwLock<Vec<Appointment>>,
    store: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn DoctorCatalog>,
    rules: BookingRules,
    clock: Arc<dyn Clock>,
    validator: BookingValidator,
    pricing: PricingService,
    lifecycle: AppointmentLifecycleService,
}

impl BookingLedger {
    /// Load the ledger from its store.
    pub async fn load(
        store: Arc<dyn AppointmentStore>,
        catalog: Arc<dyn DoctorCatalog>,
        rules: BookingRules,
    ) -> Result<Self, AppointmentError> {
        let appointments = store.load_all().await.map_err(store_error)?;
        report_double_bookings(&appointments);

        info!("Booking ledger loaded with {} appointments", appointments.len());

        Ok(Self {
            appointments: RwLock::new(appointments),
            store,
            catalog,
            validator: BookingValidator::new(&rules),
            pricing: PricingService::new(&rules),
            lifecycle: AppointmentLifecycleService::new(),
            clock: Arc::new(SystemClock),
            rules,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub async fn is_slot_available(&self, doctor_id: DoctorId, date: NaiveDate, time: NaiveTime) -> bool {
        let slot = SlotKey { doctor_id, date, time };
        let appointments = self.appointments.read().await;
        !appointments.iter().any(|a| a.occupies(&slot))
    }

    /// Every offered slot of the doctor on `date`, with whether it can still be booked.
    #[instrument(skip(self))]
    pub async fn slot_availability(
        &self,
        doctor_id: DoctorId,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, AppointmentError> {
        let doctor = self.get_doctor(doctor_id).await?;
        let appointments = self.appointments.read().await;

        let slots = doctor
            .timing
            .offered_slots()
            .into_iter()
            .map(|time| {
                let slot = SlotKey { doctor_id, date, time };
                SlotAvailability {
                    time,
                    available: !appointments.iter().any(|a| a.occupies(&slot)),
                }
            })
            .collect();

        Ok(slots)
    }

    #[instrument(skip(self, request), fields(doctor_id = request.doctor_id))]
    pub async fn book_appointment(
        &self,
        user_id: &str,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor = self.get_doctor(request.doctor_id).await?;
        let now = self.clock.now();
        let ValidatedBooking { date, time, patient } = self
            .validator
            .validate_booking(&request, &doctor, self.rules.today(now))?;

        let slot = SlotKey { doctor_id: doctor.id, date, time };
        let mut appointments = self.appointments.write().await;

        if appointments.iter().any(|a| a.occupies(&slot)) {
            warn!("Booking conflict for {}", slot);
            return Err(AppointmentError::Conflict(slot));
        }

        let fees = self.pricing.calculate_fees(&doctor);
        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            doctor_id: doctor.id,
            date,
            time,
            status: AppointmentStatus::Scheduled,
            patient,
            consultation_fee: fees.consultation_fee,
            platform_fee: fees.platform_fee,
            total_fee: fees.total_fee,
            appointment_number: generate_appointment_number(now),
            created_at: now,
            updated_at: now,
        };

        let mut next = appointments.clone();
        next.push(appointment.clone());
        self.store
            .save_all(&next)
            .await
            .map_err(|e| slot_store_error(e, slot))?;
        *appointments = next;

        info!(
            "Booked appointment {} ({}) for {}",
            appointment.appointment_number, appointment.id, slot
        );
        Ok(appointment)
    }

    #[instrument(skip(self))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        requesting_user_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, Some(requesting_user_id), AppointmentStatus::Cancelled)
            .await
    }

    /// Marks a visit as held. Callers are responsible for checking the caller's role.
    #[instrument(skip(self))]
    pub async fn complete_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.transition(appointment_id, None, AppointmentStatus::Completed).await
    }

    /// The user's appointments in booking order.
    pub async fn list_appointments(&self, user_id: &str) -> Vec<Appointment> {
        let appointments = self.appointments.read().await;
        let owned: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.is_owned_by(user_id))
            .cloned()
            .collect();

        debug!("Listing {} appointments for user {}", owned.len(), user_id);
        owned
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        requesting_user_id: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.find_appointment(appointment_id).await?;
        if !appointment.is_owned_by(requesting_user_id) {
            return Err(AppointmentError::Forbidden);
        }
        Ok(appointment)
    }

    /// Lookup without an ownership check, for staff callers.
    pub async fn find_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointments = self.appointments.read().await;
        appointments
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .ok_or(AppointmentError::NotFound)
    }

    async fn transition(
        &self,
        appointment_id: Uuid,
        owner: Option<&str>,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.appointments.write().await;

        let index = appointments
            .iter()
            .position(|a| a.id == appointment_id)
            .ok_or(AppointmentError::NotFound)?;

        if let Some(user_id) = owner {
            if !appointments[index].is_owned_by(user_id) {
                warn!("User {} attempted to modify appointment {}", user_id, appointment_id);
                return Err(AppointmentError::Forbidden);
            }
        }

        self.lifecycle
            .validate_status_transition(appointments[index].status, new_status)?;

        let mut next = appointments.clone();
        next[index].status = new_status;
        next[index].updated_at = self.clock.now();
        let updated = next[index].clone();

        self.store.save_all(&next).await.map_err(store_error)?;
        *appointments = next;

        info!("Appointment {} is now {}", appointment_id, new_status);
        Ok(updated)
    }

    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Doctor, AppointmentError> {
        self.catalog.get_doctor(doctor_id).await.map_err(|e| match e {
            DoctorError::NotFound(id) => AppointmentError::DoctorNotFound(id),
            DoctorError::CatalogUnavailable(message) => AppointmentError::StoreUnavailable(message),
        })
    }
}

fn store_error(e: DatabaseError) -> AppointmentError {
    error!("Appointment store failed: {}", e);
    AppointmentError::StoreUnavailable(e.to_string())
}

fn slot_store_error(e: DatabaseError, slot: SlotKey) -> AppointmentError {
    if e.is_conflict() {
        warn!("Store rejected duplicate booking for {}", slot);
        return AppointmentError::Conflict(slot);
    }
    store_error(e)
}

/// Stores written by other processes may already hold two scheduled rows for one slot.
fn report_double_bookings(appointments: &[Appointment]) {
    let mut seen = std::collections::HashSet::new();
    for appointment in appointments.iter().filter(|a| a.status == AppointmentStatus::Scheduled) {
        if !seen.insert(appointment.slot()) {
            warn!(
                "Loaded ledger holds more than one scheduled appointment for {}",
                appointment.slot()
            );
        }
    }
}
