mod seed;
mod sqlite;

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use herd_core::{Animal, Booking, ConsultationRecord, Veterinarian};
use parking_lot::RwLock;
use thiserror::Error;

pub use seed::demo_directory;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("booking {0} already exists; bookings are append-only")]
    DuplicateBooking(String),
    #[error("stored {what} could not be decoded")]
    Corrupt {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored timestamp {value:?} is not RFC 3339")]
    CorruptTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub trait AnimalRepository: Send + Sync {
    async fn list_animals(&self, owner_id: &str) -> Result<Vec<Animal>>;
    async fn get_animal(&self, animal_id: &str) -> Result<Option<Animal>>;
    async fn save_animal(&self, animal: &Animal) -> Result<()>;
}

pub trait VeterinarianRepository: Send + Sync {
    async fn list_veterinarians(&self) -> Result<Vec<Veterinarian>>;
    async fn get_veterinarian(&self, veterinarian_id: &str) -> Result<Option<Veterinarian>>;
    async fn upsert_veterinarian(&self, vet: &Veterinarian) -> Result<()>;
}

pub trait BookingRepository: Send + Sync {
    /// Appends a booking. Refuses an id that is already stored.
    async fn save_booking(&self, booking: &Booking) -> Result<()>;
    async fn list_bookings_for_veterinarian(&self, veterinarian_id: &str) -> Result<Vec<Booking>>;
    async fn list_bookings_for_animal(&self, animal_id: &str) -> Result<Vec<Booking>>;
}

pub trait ConsultationRepository: Send + Sync {
    async fn save_consultation(&self, record: &ConsultationRecord) -> Result<()>;
    async fn list_consultations(&self, animal_id: &str) -> Result<Vec<ConsultationRecord>>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    animals: Arc<RwLock<Vec<Animal>>>,
    veterinarians: Arc<RwLock<Vec<Veterinarian>>>,
    bookings: Arc<RwLock<Vec<Booking>>>,
    consultations: Arc<RwLock<Vec<ConsultationRecord>>>,
    booking_ids: Arc<RwLock<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimalRepository for MemoryStore {
    async fn list_animals(&self, owner_id: &str) -> Result<Vec<Animal>> {
        Ok(self
            .animals
            .read()
            .iter()
            .filter(|animal| animal.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_animal(&self, animal_id: &str) -> Result<Option<Animal>> {
        Ok(self
            .animals
            .read()
            .iter()
            .find(|animal| animal.id == animal_id)
            .cloned())
    }

    async fn save_animal(&self, animal: &Animal) -> Result<()> {
        let mut animals = self.animals.write();
        match animals.iter_mut().find(|existing| existing.id == animal.id) {
            Some(existing) => *existing = animal.clone(),
            None => animals.push(animal.clone()),
        }
        Ok(())
    }
}

impl VeterinarianRepository for MemoryStore {
    async fn list_veterinarians(&self) -> Result<Vec<Veterinarian>> {
        Ok(self.veterinarians.read().clone())
    }

    async fn get_veterinarian(&self, veterinarian_id: &str) -> Result<Option<Veterinarian>> {
        Ok(self
            .veterinarians
            .read()
            .iter()
            .find(|vet| vet.id == veterinarian_id)
            .cloned())
    }

    async fn upsert_veterinarian(&self, vet: &Veterinarian) -> Result<()> {
        let mut veterinarians = self.veterinarians.write();
        match veterinarians.iter_mut().find(|existing| existing.id == vet.id) {
            Some(existing) => *existing = vet.clone(),
            None => veterinarians.push(vet.clone()),
        }
        Ok(())
    }
}

impl BookingRepository for MemoryStore {
    async fn save_booking(&self, booking: &Booking) -> Result<()> {
        let mut ids = self.booking_ids.write();
        if !ids.insert(booking.id.clone()) {
            return Err(StorageError::DuplicateBooking(booking.id.clone()).into());
        }

        self.bookings.write().push(booking.clone());
        Ok(())
    }

    async fn list_bookings_for_veterinarian(&self, veterinarian_id: &str) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .iter()
            .filter(|booking| booking.veterinarian_id == veterinarian_id)
            .cloned()
            .collect())
    }

    async fn list_bookings_for_animal(&self, animal_id: &str) -> Result<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .iter()
            .filter(|booking| booking.animal_id == animal_id)
            .cloned()
            .collect())
    }
}

impl ConsultationRepository for MemoryStore {
    async fn save_consultation(&self, record: &ConsultationRecord) -> Result<()> {
        self.consultations.write().push(record.clone());
        Ok(())
    }

    async fn list_consultations(&self, animal_id: &str) -> Result<Vec<ConsultationRecord>> {
        Ok(self
            .consultations
            .read()
            .iter()
            .filter(|record| record.animal_id.as_deref() == Some(animal_id))
            .cloned()
            .collect())
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl AnimalRepository for Store {
    async fn list_animals(&self, owner_id: &str) -> Result<Vec<Animal>> {
        match self {
            Store::Memory(store) => store.list_animals(owner_id).await,
            Store::Sqlite(store) => store.list_animals(owner_id).await,
        }
    }

    async fn get_animal(&self, animal_id: &str) -> Result<Option<Animal>> {
        match self {
            Store::Memory(store) => store.get_animal(animal_id).await,
            Store::Sqlite(store) => store.get_animal(animal_id).await,
        }
    }

    async fn save_animal(&self, animal: &Animal) -> Result<()> {
        match self {
            Store::Memory(store) => store.save_animal(animal).await,
            Store::Sqlite(store) => store.save_animal(animal).await,
        }
    }
}

impl VeterinarianRepository for Store {
    async fn list_veterinarians(&self) -> Result<Vec<Veterinarian>> {
        match self {
            Store::Memory(store) => store.list_veterinarians().await,
            Store::Sqlite(store) => store.list_veterinarians().await,
        }
    }

    async fn get_veterinarian(&self, veterinarian_id: &str) -> Result<Option<Veterinarian>> {
        match self {
            Store::Memory(store) => store.get_veterinarian(veterinarian_id).await,
            Store::Sqlite(store) => store.get_veterinarian(veterinarian_id).await,
        }
    }

    async fn upsert_veterinarian(&self, vet: &Veterinarian) -> Result<()> {
        match self {
            Store::Memory(store) => store.upsert_veterinarian(vet).await,
            Store::Sqlite(store) => store.upsert_veterinarian(vet).await,
        }
    }
}

impl BookingRepository for Store {
    async fn save_booking(&self, booking: &Booking) -> Result<()> {
        match self {
            Store::Memory(store) => store.save_booking(booking).await,
            Store::Sqlite(store) => store.save_booking(booking).await,
        }
    }

    async fn list_bookings_for_veterinarian(&self, veterinarian_id: &str) -> Result<Vec<Booking>> {
        match self {
            Store::Memory(store) => store.list_bookings_for_veterinarian(veterinarian_id).await,
            Store::Sqlite(store) => store.list_bookings_for_veterinarian(veterinarian_id).await,
        }
    }

    async fn list_bookings_for_animal(&self, animal_id: &str) -> Result<Vec<Booking>> {
        match self {
            Store::Memory(store) => store.list_bookings_for_animal(animal_id).await,
            Store::Sqlite(store) => store.list_bookings_for_animal(animal_id).await,
        }
    }
}

impl ConsultationRepository for Store {
    async fn save_consultation(&self, record: &ConsultationRecord) -> Result<()> {
        match self {
            Store::Memory(store) => store.save_consultation(record).await,
            Store::Sqlite(store) => store.save_consultation(record).await,
        }
    }

    async fn list_consultations(&self, animal_id: &str) -> Result<Vec<ConsultationRecord>> {
        match self {
            Store::Memory(store) => store.list_consultations(animal_id).await,
            Store::Sqlite(store) => store.list_consultations(animal_id).await,
        }
    }
}
