use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use herd_core::{Animal, Booking, BookingStatus, ConsultationRecord, Veterinarian};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::{
    AnimalRepository, BookingRepository, ConsultationRepository, StorageError,
    VeterinarianRepository,
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        // Every connection to `:memory:` opens its own empty database.
        let in_memory = database_url.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            options = options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS animals (
              id TEXT PRIMARY KEY,
              owner_id TEXT NOT NULL,
              record_json TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS veterinarians (
              id TEXT PRIMARY KEY,
              position INTEGER NOT NULL,
              name TEXT NOT NULL,
              qualification TEXT NOT NULL,
              specialization TEXT NOT NULL,
              experience TEXT NOT NULL,
              rating REAL NOT NULL,
              appointment_fee INTEGER NOT NULL,
              location TEXT NOT NULL,
              clinic_address TEXT NOT NULL,
              slots_json TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
              id TEXT PRIMARY KEY,
              veterinarian_id TEXT NOT NULL,
              animal_id TEXT NOT NULL,
              date TEXT NOT NULL,
              time_slot TEXT NOT NULL,
              fee INTEGER NOT NULL,
              status TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consultations (
              id TEXT PRIMARY KEY,
              animal_id TEXT,
              symptoms TEXT NOT NULL,
              verdict_json TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl AnimalRepository for SqliteStore {
    async fn list_animals(&self, owner_id: &str) -> Result<Vec<Animal>> {
        let rows = sqlx::query(
            r#"
            SELECT record_json
            FROM animals
            WHERE owner_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(animal_from_row).collect()
    }

    async fn get_animal(&self, animal_id: &str) -> Result<Option<Animal>> {
        let row = sqlx::query("SELECT record_json FROM animals WHERE id = ?1")
            .bind(animal_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(animal_from_row).transpose()
    }

    async fn save_animal(&self, animal: &Animal) -> Result<()> {
        let record_json = serde_json::to_string(animal)?;

        sqlx::query(
            r#"
            INSERT INTO animals (id, owner_id, record_json, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
              owner_id=excluded.owner_id,
              record_json=excluded.record_json
            "#,
        )
        .bind(&animal.id)
        .bind(&animal.owner_id)
        .bind(record_json)
        .bind(animal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl VeterinarianRepository for SqliteStore {
    async fn list_veterinarians(&self) -> Result<Vec<Veterinarian>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, qualification, specialization, experience, rating,
                   appointment_fee, location, clinic_address, slots_json
            FROM veterinarians
            ORDER BY position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(veterinarian_from_row).collect()
    }

    async fn get_veterinarian(&self, veterinarian_id: &str) -> Result<Option<Veterinarian>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, qualification, specialization, experience, rating,
                   appointment_fee, location, clinic_address, slots_json
            FROM veterinarians
            WHERE id = ?1
            "#,
        )
        .bind(veterinarian_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(veterinarian_from_row).transpose()
    }

    async fn upsert_veterinarian(&self, vet: &Veterinarian) -> Result<()> {
        let slots_json = serde_json::to_string(&vet.available_slots)?;

        sqlx::query(
            r#"
            INSERT INTO veterinarians (
              id, position, name, qualification, specialization, experience, rating,
              appointment_fee, location, clinic_address, slots_json
            )
            VALUES (
              ?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM veterinarians),
              ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
            )
            ON CONFLICT(id) DO UPDATE SET
              name=excluded.name,
              qualification=excluded.qualification,
              specialization=excluded.specialization,
              experience=excluded.experience,
              rating=excluded.rating,
              appointment_fee=excluded.appointment_fee,
              location=excluded.location,
              clinic_address=excluded.clinic_address,
              slots_json=excluded.slots_json
            "#,
        )
        .bind(&vet.id)
        .bind(&vet.name)
        .bind(&vet.qualification)
        .bind(&vet.specialization)
        .bind(&vet.experience)
        .bind(f64::from(vet.rating))
        .bind(i64::from(vet.appointment_fee))
        .bind(&vet.location)
        .bind(&vet.clinic_address)
        .bind(slots_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl BookingRepository for SqliteStore {
    async fn save_booking(&self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
              id, veterinarian_id, animal_id, date, time_slot, fee, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.veterinarian_id)
        .bind(&booking.animal_id)
        .bind(&booking.date)
        .bind(&booking.time_slot)
        .bind(i64::from(booking.fee))
        .bind(booking.status.as_code())
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(StorageError::DuplicateBooking(booking.id.clone()).into())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list_bookings_for_veterinarian(&self, veterinarian_id: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, veterinarian_id, animal_id, date, time_slot, fee, status, created_at
            FROM bookings
            WHERE veterinarian_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(veterinarian_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    async fn list_bookings_for_animal(&self, animal_id: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, veterinarian_id, animal_id, date, time_slot, fee, status, created_at
            FROM bookings
            WHERE animal_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }
}

impl ConsultationRepository for SqliteStore {
    async fn save_consultation(&self, record: &ConsultationRecord) -> Result<()> {
        let verdict_json = serde_json::to_string(&record.verdict)?;

        sqlx::query(
            r#"
            INSERT INTO consultations (id, animal_id, symptoms, verdict_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.animal_id)
        .bind(&record.symptoms)
        .bind(verdict_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_consultations(&self, animal_id: &str) -> Result<Vec<ConsultationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, animal_id, symptoms, verdict_json, created_at
            FROM consultations
            WHERE animal_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(animal_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ConsultationRecord> {
                let verdict_json: String = row.get("verdict_json");
                let verdict = serde_json::from_str(&verdict_json).map_err(|source| {
                    StorageError::Corrupt {
                        what: "consultation verdict",
                        source,
                    }
                })?;

                Ok(ConsultationRecord {
                    id: row.get("id"),
                    animal_id: row.get("animal_id"),
                    symptoms: row.get("symptoms"),
                    verdict,
                    created_at: parse_timestamp(row.get("created_at"))?,
                })
            })
            .collect()
    }
}

fn animal_from_row(row: &SqliteRow) -> Result<Animal> {
    let record_json: String = row.get("record_json");
    let animal = serde_json::from_str(&record_json).map_err(|source| StorageError::Corrupt {
        what: "animal record",
        source,
    })?;
    Ok(animal)
}

fn veterinarian_from_row(row: &SqliteRow) -> Result<Veterinarian> {
    let slots_json: String = row.get("slots_json");
    let available_slots =
        serde_json::from_str(&slots_json).map_err(|source| StorageError::Corrupt {
            what: "veterinarian slots",
            source,
        })?;

    Ok(Veterinarian {
        id: row.get("id"),
        name: row.get("name"),
        qualification: row.get("qualification"),
        specialization: row.get("specialization"),
        experience: row.get("experience"),
        rating: row.get::<f64, _>("rating") as f32,
        appointment_fee: u32::try_from(row.get::<i64, _>("appointment_fee"))
            .context("stored appointment fee out of range")?,
        location: row.get("location"),
        clinic_address: row.get("clinic_address"),
        available_slots,
    })
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking> {
    let status: String = row.get("status");

    Ok(Booking {
        id: row.get("id"),
        veterinarian_id: row.get("veterinarian_id"),
        animal_id: row.get("animal_id"),
        date: row.get("date"),
        time_slot: row.get("time_slot"),
        fee: u32::try_from(row.get::<i64, _>("fee")).context("stored booking fee out of range")?,
        status: BookingStatus::from_code(&status)
            .with_context(|| format!("unknown booking status {status}"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    let parsed: DateTime<Utc> = value
        .parse()
        .map_err(|source| StorageError::CorruptTimestamp { value, source })?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_directory;
    use herd_core::{diagnose, CurrentUser, NewAnimal, Species, UserRole};

    async fn memory_db() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn directory_round_trips_in_order() {
        let store = memory_db().await;
        for vet in demo_directory() {
            store.upsert_veterinarian(&vet).await.unwrap();
        }

        let listed = store.list_veterinarians().await.unwrap();
        assert_eq!(listed, demo_directory());

        let mut changed = listed[1].clone();
        changed.available_slots.push("06:00 PM".to_string());
        store.upsert_veterinarian(&changed).await.unwrap();

        let fetched = store.get_veterinarian("2").await.unwrap().unwrap();
        assert_eq!(fetched.available_slots.len(), 5);
        assert_eq!(store.list_veterinarians().await.unwrap()[1].id, "2");
    }

    #[tokio::test]
    async fn duplicate_booking_id_is_refused() {
        let store = memory_db().await;
        let booking = Booking {
            id: "b1".to_string(),
            veterinarian_id: "1".to_string(),
            animal_id: "a1".to_string(),
            date: "2024-03-20".to_string(),
            time_slot: "09:00 AM".to_string(),
            fee: 800,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        };

        store.save_booking(&booking).await.unwrap();
        let err = store.save_booking(&booking).await.unwrap_err();
        assert!(err.downcast_ref::<StorageError>().is_some());

        let stored = store.list_bookings_for_animal("a1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn animals_and_consultations_persist() {
        let store = memory_db().await;
        let owner = CurrentUser {
            id: "f1".to_string(),
            name: "John Farmer".to_string(),
            role: UserRole::Farmer,
        };
        let animal = Animal::register(
            NewAnimal {
                name: "Bhola".to_string(),
                species: Species::Goat,
                breed: None,
                age: Some("2 years".to_string()),
                weight_kg: Some(31.5),
                date_of_birth: None,
                notes: None,
            },
            &owner,
        )
        .unwrap();
        store.save_animal(&animal).await.unwrap();
        assert_eq!(store.list_animals("f1").await.unwrap(), vec![animal.clone()]);

        let record = ConsultationRecord {
            id: "c1".to_string(),
            animal_id: Some(animal.id.clone()),
            symptoms: "limping".to_string(),
            verdict: diagnose("limping"),
            created_at: Utc::now(),
        };
        store.save_consultation(&record).await.unwrap();

        let history = store.list_consultations(&animal.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].verdict, record.verdict);
    }

    #[tokio::test]
    async fn unreadable_booking_timestamp_is_an_error() {
        let store = memory_db().await;
        sqlx::query(
            r#"
            INSERT INTO bookings (
              id, veterinarian_id, animal_id, date, time_slot, fee, status, created_at
            )
            VALUES ('b9', '1', 'a9', '2024-03-20', '09:00 AM', 800, 'confirmed', 'yesterday')
            "#,
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.list_bookings_for_animal("a9").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::CorruptTimestamp { .. })
        ));
    }
}
