use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::models::{Doctor, DoctorError, DoctorSearchQuery, DoctorSortKey};
use crate::services::catalog::DoctorCatalog;

pub struct DirectoryService {
    catalog: Arc<dyn DoctorCatalog>,
}

impl DirectoryService {
    pub fn new(catalog: Arc<dyn DoctorCatalog>) -> Self {
        Self { catalog }
    }

    /// Filter by specialty, then by free-text term, then sort.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &DoctorSearchQuery) -> Result<Vec<Doctor>, DoctorError> {
        let mut doctors = self.catalog.list_doctors().await?;

        if let Some(specialty) = query.specialty.as_deref().filter(|s| !s.trim().is_empty()) {
            doctors.retain(|d| d.specialty == specialty.trim());
        }

        if let Some(term) = query.search.as_deref().map(|s| s.trim().to_lowercase()) {
            if !term.is_empty() {
                doctors.retain(|d| {
                    d.name.to_lowercase().contains(&term)
                        || d.specialty.to_lowercase().contains(&term)
                        || d.location.to_lowercase().contains(&term)
                });
            }
        }

        if let Some(sort_key) = query.sort_by {
            sort_doctors(&mut doctors, sort_key);
        }

        debug!("Directory search matched {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn specialties(&self) -> Result<Vec<String>, DoctorError> {
        let mut specialties: Vec<String> = self
            .catalog
            .list_doctors()
            .await?
            .into_iter()
            .map(|d| d.specialty)
            .collect();
        specialties.sort();
        specialties.dedup();
        Ok(specialties)
    }
}

pub fn sort_doctors(doctors: &mut [Doctor], sort_key: DoctorSortKey) {
    match sort_key {
        DoctorSortKey::Name => doctors.sort_by(|a, b| a.name.cmp(&b.name)),
        DoctorSortKey::Rating => doctors.sort_by(|a, b| {
            b.rating.partial_cmp(&a.rating).unwrap_or(Ordering::Equal)
        }),
        DoctorSortKey::Experience => {
            doctors.sort_by(|a, b| b.experience_years.cmp(&a.experience_years))
        }
        DoctorSortKey::Fee => doctors.sort_by_key(|d| d.fee),
    }
}
