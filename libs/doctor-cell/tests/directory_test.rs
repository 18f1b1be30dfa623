use std::sync::Arc;

use doctor_cell::models::{DoctorSearchQuery, DoctorSortKey};
use doctor_cell::services::{DirectoryService, StaticDoctorCatalog};

fn directory() -> DirectoryService {
    DirectoryService::new(Arc::new(StaticDoctorCatalog::builtin()))
}

fn names(doctors: &[doctor_cell::Doctor]) -> Vec<&str> {
    doctors.iter().map(|d| d.name.as_str()).collect()
}

#[tokio::test]
async fn test_empty_query_returns_catalog_order() {
    let doctors = directory().search(&DoctorSearchQuery::default()).await.unwrap();
    let ids: Vec<u32> = doctors.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_specialty_filter_is_exact() {
    let query = DoctorSearchQuery {
        specialty: Some("Cardiologist".to_string()),
        ..Default::default()
    };
    let doctors = directory().search(&query).await.unwrap();
    assert_eq!(names(&doctors), vec!["Dr. Rajesh Kumar"]);

    let partial = DoctorSearchQuery {
        specialty: Some("Cardio".to_string()),
        ..Default::default()
    };
    assert!(directory().search(&partial).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_term_matches_name_specialty_or_location() {
    let by_location = DoctorSearchQuery {
        search: Some("  CLINIC ".to_string()),
        ..Default::default()
    };
    assert_eq!(names(&directory().search(&by_location).await.unwrap()), vec!["Dr. Priya Patel"]);

    let by_specialty = DoctorSearchQuery {
        search: Some("neuro".to_string()),
        ..Default::default()
    };
    assert_eq!(names(&directory().search(&by_specialty).await.unwrap()), vec!["Dr. Vikram Joshi"]);

    let by_name = DoctorSearchQuery {
        search: Some("singh".to_string()),
        ..Default::default()
    };
    assert_eq!(names(&directory().search(&by_name).await.unwrap()), vec!["Dr. Amit Singh"]);
}

#[tokio::test]
async fn test_sort_orders() {
    let sorted = |key| DoctorSearchQuery {
        sort_by: Some(key),
        ..Default::default()
    };

    let by_fee = directory().search(&sorted(DoctorSortKey::Fee)).await.unwrap();
    let fees: Vec<u32> = by_fee.iter().map(|d| d.fee).collect();
    assert_eq!(fees, vec![149, 179, 199, 249, 299, 399]);

    let by_experience = directory().search(&sorted(DoctorSortKey::Experience)).await.unwrap();
    assert_eq!(by_experience[0].name, "Dr. Amit Singh");
    assert_eq!(by_experience[5].name, "Dr. Ananya Sharma");

    let by_rating = directory().search(&sorted(DoctorSortKey::Rating)).await.unwrap();
    assert!(by_rating.windows(2).all(|w| w[0].rating >= w[1].rating));
    assert_eq!(by_rating[5].name, "Dr. Amit Singh");

    let by_name = directory().search(&sorted(DoctorSortKey::Name)).await.unwrap();
    assert_eq!(by_name[0].name, "Dr. Amit Singh");
    assert_eq!(by_name[5].name, "Dr. Vikram Joshi");
}

#[tokio::test]
async fn test_specialties_are_unique_and_sorted() {
    let specialties = directory().specialties().await.unwrap();
    assert_eq!(specialties.len(), 6);
    assert_eq!(specialties[0], "Cardiologist");
    assert!(specialties.windows(2).all(|w| w[0] < w[1]));
}
