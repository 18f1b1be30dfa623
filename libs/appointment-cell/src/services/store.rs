// libs/appointment-cell/src/services/store.rs
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use shared_database::local_storage::LocalStorage;
use shared_database::supabase::SupabaseClient;
use shared_database::DatabaseError;

use crate::models::Appointment;

/// Key the appointment list lives under in local storage.
pub const APPOINTMENTS_KEY: &str = "appointments";
pub const APPOINTMENTS_TABLE: &str = "appointments";

/// Durable backing for the ledger. The ledger writes the whole collection after
/// every mutation and only commits in memory once `save_all` succeeds.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<Appointment>, DatabaseError>;

    async fn save_all(&self, appointments: &[Appointment]) -> Result<(), DatabaseError>;
}

// ==============================================================================
// IN-MEMORY
// ==============================================================================

#[derive(Default)]
pub struct MemoryAppointmentStore {
    appointments: Mutex<Vec<Appointment>>,
}

impl MemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointments(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
        }
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn load_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
        Ok(self.appointments.lock().await.clone())
    }

    async fn save_all(&self, appointments: &[Appointment]) -> Result<(), DatabaseError> {
        *self.appointments.lock().await = appointments.to_vec();
        Ok(())
    }
}

// ==============================================================================
// LOCAL FILE
// ==============================================================================

pub struct LocalAppointmentStore {
    storage: LocalStorage,
}

impl LocalAppointmentStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl AppointmentStore for LocalAppointmentStore {
    async fn load_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments: Vec<Appointment> = self
            .storage
            .get_item(APPOINTMENTS_KEY)
            .await?
            .unwrap_or_default();

        info!(
            "Loaded {} appointments from {}",
            appointments.len(),
            self.storage.path().display()
        );
        Ok(appointments)
    }

    async fn save_all(&self, appointments: &[Appointment]) -> Result<(), DatabaseError> {
        self.storage.set_item(APPOINTMENTS_KEY, appointments).await
    }
}

// ==============================================================================
// SUPABASE
// ==============================================================================

pub struct SupabaseAppointmentStore {
    client: SupabaseClient,
    table: String,
}

impl SupabaseAppointmentStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            table: APPOINTMENTS_TABLE.to_string(),
        }
    }

    fn upsert_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=minimal"),
        );
        headers
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn load_all(&self) -> Result<Vec<Appointment>, DatabaseError> {
        let path = format!("/rest/v1/{}?select=*&order=created_at.asc", self.table);
        let appointments: Vec<Appointment> = self.client.request(Method::GET, &path, None, None).await?;

        info!("Loaded {} appointments from Supabase", appointments.len());
        Ok(appointments)
    }

    /// Upserts every row by id. A unique index on scheduled slots turns a racing
    /// duplicate from another process into a 409.
    async fn save_all(&self, appointments: &[Appointment]) -> Result<(), DatabaseError> {
        if appointments.is_empty() {
            return Ok(());
        }

        let path = format!("/rest/v1/{}?on_conflict=id", self.table);
        let body = serde_json::to_value(appointments)?;

        debug!("Upserting {} appointments", appointments.len());
        self.client
            .execute(Method::POST, &path, None, Some(body), Some(Self::upsert_headers()))
            .await
    }
}
