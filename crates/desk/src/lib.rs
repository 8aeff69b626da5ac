mod config;

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use herd_core::{
    available_dates, rank, render_assessment, suggested_actions, Animal, Booking, BookingConstraint,
    BookingError, BookingRequest, ConsultationRecord, CurrentUser, DiagnosisVerdict, NewAnimal,
    ProviderOrder, RegistryError, ReportError, SuggestedAction, SymptomReport, TriageEngine,
    Veterinarian,
};
use herd_observability::AppMetrics;
use herd_storage::{
    demo_directory, AnimalRepository, BookingRepository, ConsultationRepository,
    VeterinarianRepository,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub use config::{DeskConfig, DEFAULT_API_KEY, DEFAULT_BIND};

pub trait DeskStore:
    AnimalRepository + VeterinarianRepository + BookingRepository + ConsultationRepository
{
}

impl<T> DeskStore for T where
    T: AnimalRepository + VeterinarianRepository + BookingRepository + ConsultationRepository
{
}

#[derive(Debug, Error)]
pub enum DeskError {
    #[error(transparent)]
    EmptyReport(#[from] ReportError),
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("veterinarian {0} is not in the directory")]
    UnknownVeterinarian(String),
    #[error("animal {0} is not registered")]
    UnknownAnimal(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DeskError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyReport(_) => "empty_report",
            Self::Booking(err) => err.code(),
            Self::Registry(_) => "missing_name",
            Self::UnknownVeterinarian(_) => "unknown_veterinarian",
            Self::UnknownAnimal(_) => "unknown_animal",
            Self::Storage(_) => "storage_failure",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationInput {
    #[serde(default)]
    pub animal_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationReply {
    pub consultation_id: String,
    pub animal_id: Option<String>,
    pub reply_text: String,
    pub verdict: DiagnosisVerdict,
    pub suggested_actions: Vec<SuggestedAction>,
}

/// One animal with everything recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalProfile {
    pub animal: Animal,
    pub bookings: Vec<Booking>,
    pub consultations: Vec<ConsultationRecord>,
}

#[derive(Clone)]
pub struct ClinicDesk<S>
where
    S: DeskStore,
{
    engine: TriageEngine,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> ClinicDesk<S>
where
    S: DeskStore,
{
    pub fn new(engine: TriageEngine, store: Arc<S>, metrics: Arc<AppMetrics>) -> Self {
        Self {
            engine,
            store,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[instrument(skip(self, input))]
    pub async fn consult(&self, input: ConsultationInput) -> Result<ConsultationReply, DeskError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let report = SymptomReport::new(&input.text)?;
        let verdict = self.engine.assess(&report);
        let animal_id = input
            .animal_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        let record = ConsultationRecord {
            id: Uuid::new_v4().to_string(),
            animal_id: animal_id.clone(),
            symptoms: report.text().to_string(),
            verdict: verdict.clone(),
            created_at: Utc::now(),
        };
        self.store.save_consultation(&record).await?;
        self.metrics.record_consultation(verdict.severity.as_str());

        let reply = ConsultationReply {
            consultation_id: record.id,
            reply_text: render_assessment(&verdict),
            suggested_actions: suggested_actions(&verdict, animal_id.as_deref()),
            animal_id,
            verdict,
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            consultation_id = %reply.consultation_id,
            rule = ?reply.verdict.rule,
            severity = reply.verdict.severity.as_str(),
            "consultation assessed"
        );

        Ok(reply)
    }

    pub async fn search_veterinarians(
        &self,
        constraint: &BookingConstraint,
        order: ProviderOrder,
    ) -> Result<Vec<Veterinarian>, DeskError> {
        self.metrics.inc_request();

        let directory = self.store.list_veterinarians().await?;
        let matched = rank(herd_core::filter(&directory, constraint), order);
        self.metrics.record_search(matched.len());

        info!(
            directory = directory.len(),
            matched = matched.len(),
            order = ?order,
            "veterinarian search"
        );
        Ok(matched)
    }

    #[instrument(skip(self, request), fields(veterinarian_id = %request.veterinarian_id))]
    pub async fn book(&self, request: BookingRequest) -> Result<Booking, DeskError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let outcome = self.try_book(&request).await;
        match &outcome {
            Ok(booking) => {
                self.metrics.record_booking_confirmed();
                info!(
                    booking_id = %booking.id,
                    date = %booking.date,
                    slot = %booking.time_slot,
                    fee = booking.fee,
                    "booking confirmed"
                );
            }
            Err(err) => {
                self.metrics.record_booking_refused(err.code());
                warn!(reason = err.code(), error = %err, "booking refused");
            }
        }

        self.metrics.observe_latency(started.elapsed());
        outcome
    }

    async fn try_book(&self, request: &BookingRequest) -> Result<Booking, DeskError> {
        let veterinarian_id = request.veterinarian_id.trim();
        if veterinarian_id.is_empty() {
            return Err(BookingError::MissingVeterinarian.into());
        }

        let vet = self
            .store
            .get_veterinarian(veterinarian_id)
            .await?
            .ok_or_else(|| DeskError::UnknownVeterinarian(veterinarian_id.to_string()))?;

        let booking = herd_core::book(request, &vet)?;
        self.store.save_booking(&booking).await?;
        Ok(booking)
    }

    pub async fn register_animal(
        &self,
        owner: &CurrentUser,
        form: NewAnimal,
    ) -> Result<Animal, DeskError> {
        self.metrics.inc_request();

        let animal = Animal::register(form, owner)?;
        self.store.save_animal(&animal).await?;

        info!(animal_id = %animal.id, owner_id = %owner.id, species = ?animal.species, "animal registered");
        Ok(animal)
    }

    pub async fn list_animals(&self, owner_id: &str) -> Result<Vec<Animal>, DeskError> {
        Ok(self.store.list_animals(owner_id).await?)
    }

    pub async fn animal_profile(&self, animal_id: &str) -> Result<AnimalProfile, DeskError> {
        let animal_id = animal_id.trim();
        let animal = self
            .store
            .get_animal(animal_id)
            .await?
            .ok_or_else(|| DeskError::UnknownAnimal(animal_id.to_string()))?;

        Ok(AnimalProfile {
            bookings: self.store.list_bookings_for_animal(&animal.id).await?,
            consultations: self.store.list_consultations(&animal.id).await?,
            animal,
        })
    }

    pub async fn veterinarian(&self, veterinarian_id: &str) -> Result<Veterinarian, DeskError> {
        let veterinarian_id = veterinarian_id.trim();
        self.store
            .get_veterinarian(veterinarian_id)
            .await?
            .ok_or_else(|| DeskError::UnknownVeterinarian(veterinarian_id.to_string()))
    }

    /// Saves an edited profile over a listed veterinarian. The rating is not editable and is kept.
    #[instrument(skip(self, vet), fields(veterinarian_id = %vet.id))]
    pub async fn update_veterinarian(&self, vet: Veterinarian) -> Result<Veterinarian, DeskError> {
        self.metrics.inc_request();

        let current = self.veterinarian(&vet.id).await?;
        let updated = Veterinarian {
            id: current.id,
            rating: current.rating,
            available_slots: vet
                .available_slots
                .iter()
                .map(|slot| slot.trim().to_string())
                .filter(|slot| !slot.is_empty())
                .collect(),
            ..vet
        };
        self.store.upsert_veterinarian(&updated).await?;

        info!(
            fee = updated.appointment_fee,
            slots = updated.available_slots.len(),
            "veterinarian profile updated"
        );
        Ok(updated)
    }

    pub async fn bookings_for_veterinarian(
        &self,
        veterinarian_id: &str,
    ) -> Result<Vec<Booking>, DeskError> {
        Ok(self
            .store
            .list_bookings_for_veterinarian(veterinarian_id)
            .await?)
    }

    pub async fn consultations_for_animal(
        &self,
        animal_id: &str,
    ) -> Result<Vec<ConsultationRecord>, DeskError> {
        Ok(self.store.list_consultations(animal_id).await?)
    }

    pub fn available_dates(&self) -> Vec<NaiveDate> {
        available_dates()
    }

    /// Loads the demo directory when no veterinarian is stored yet. Returns how many were added.
    pub async fn seed_directory_if_empty(&self) -> Result<usize, DeskError> {
        if !self.store.list_veterinarians().await?.is_empty() {
            return Ok(0);
        }

        let directory = demo_directory();
        for vet in &directory {
            self.store.upsert_veterinarian(vet).await?;
        }

        info!(count = directory.len(), "seeded veterinarian directory");
        Ok(directory.len())
    }
}
