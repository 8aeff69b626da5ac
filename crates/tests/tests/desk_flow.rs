use std::sync::Arc;

use herd_core::{
    BookingConstraint, BookingError, BookingRequest, ProviderOrder, RuleTag, Severity,
    TriageEngine,
};
use herd_desk::{ClinicDesk, ConsultationInput, DeskError};
use herd_observability::AppMetrics;
use herd_storage::Store;

async fn sqlite_desk() -> ClinicDesk<Store> {
    let store = Store::sqlite("sqlite::memory:")
        .await
        .expect("in-memory sqlite should open");
    let desk = ClinicDesk::new(
        TriageEngine::standard(),
        Arc::new(store),
        AppMetrics::shared(),
    );
    desk.seed_directory_if_empty()
        .await
        .expect("directory should seed");
    desk
}

#[tokio::test]
async fn consultation_then_booking_on_sqlite() -> anyhow::Result<()> {
    let desk = sqlite_desk().await;

    let reply = desk
        .consult(ConsultationInput {
            animal_id: Some("gauri".to_string()),
            text: "limping and some diarrhea".to_string(),
        })
        .await?;
    assert_eq!(reply.verdict.rule, RuleTag::Lameness);
    assert_eq!(reply.verdict.severity, Severity::Medium);

    let vets = desk
        .search_veterinarians(
            &BookingConstraint {
                specialization: "Ruminants".to_string(),
                max_fee: "750".to_string(),
                ..Default::default()
            },
            ProviderOrder::AsListed,
        )
        .await?;
    assert_eq!(vets.len(), 1);
    let vet = &vets[0];

    let booking = desk
        .book(BookingRequest {
            veterinarian_id: vet.id.clone(),
            animal_id: "gauri".to_string(),
            date: "2024-03-20".to_string(),
            time_slot: vet.available_slots[0].clone(),
        })
        .await?;
    assert_eq!(booking.fee, vet.appointment_fee);

    let history = desk.consultations_for_animal("gauri").await?;
    assert_eq!(history.len(), 1);
    assert_eq!(desk.bookings_for_veterinarian(&vet.id).await?, vec![booking]);
    Ok(())
}

#[tokio::test]
async fn slot_outside_the_schedule_is_refused() {
    let desk = sqlite_desk().await;

    let err = desk
        .book(BookingRequest {
            veterinarian_id: "1".to_string(),
            animal_id: "gauri".to_string(),
            date: "2024-03-20".to_string(),
            time_slot: "11:00 AM".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DeskError::Booking(BookingError::SlotUnavailable { .. })
    ));
    assert!(desk.bookings_for_veterinarian("1").await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_bookings_of_one_slot_are_all_kept() {
    let desk = sqlite_desk().await;
    let request = BookingRequest {
        veterinarian_id: "4".to_string(),
        animal_id: "bhola".to_string(),
        date: "2024-03-21".to_string(),
        time_slot: "10:00 AM".to_string(),
    };

    let first = desk.book(request.clone()).await.unwrap();
    let second = desk.book(request).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(desk.bookings_for_veterinarian("4").await.unwrap().len(), 2);
}
