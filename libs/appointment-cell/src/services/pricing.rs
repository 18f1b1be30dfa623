use serde::{Deserialize, Serialize};
use tracing::debug;

use doctor_cell::models::Doctor;

use crate::models::BookingRules;

/// Fees are whole currency units, fixed at booking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub consultation_fee: u32,
    pub platform_fee: u32,
    pub total_fee: u32,
}

#[derive(Debug, Clone)]
pub struct PricingService {
    platform_fee: u32,
}

impl PricingService {
    pub fn new(rules: &BookingRules) -> Self {
        Self {
            platform_fee: rules.platform_fee,
        }
    }

    pub fn calculate_fees(&self, doctor: &Doctor) -> FeeBreakdown {
        let breakdown = FeeBreakdown {
            consultation_fee: doctor.fee,
            platform_fee: self.platform_fee,
            total_fee: doctor.fee.saturating_add(self.platform_fee),
        };

        debug!(
            "Calculated fees for doctor {}: {} + {} = {}",
            doctor.id, breakdown.consultation_fee, breakdown.platform_fee, breakdown.total_fee
        );

        breakdown
    }

    pub fn platform_fee(&self) -> u32 {
        self.platform_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctor_cell::services::{DoctorCatalog, StaticDoctorCatalog};

    async fn doctor(id: u32) -> Doctor {
        StaticDoctorCatalog::builtin().get_doctor(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_total_is_consultation_plus_platform_fee() {
        let service = PricingService::new(&BookingRules::default());

        let fees = service.calculate_fees(&doctor(1).await);
        assert_eq!(fees.consultation_fee, 199);
        assert_eq!(fees.platform_fee, 29);
        assert_eq!(fees.total_fee, 228);
    }

    #[tokio::test]
    async fn test_configured_platform_fee_is_used() {
        let rules = BookingRules {
            platform_fee: 50,
            ..BookingRules::default()
        };
        let service = PricingService::new(&rules);

        let fees = service.calculate_fees(&doctor(6).await);
        assert_eq!(fees.total_fee, 449);
        assert_eq!(service.platform_fee(), 50);
    }
}
