use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Animal, CurrentUser, HealthStatus, NewAnimal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("animal name is required")]
    MissingName,
}

impl Animal {
    /// Turns a submitted form into a registry record owned by `owner`.
    pub fn register(form: NewAnimal, owner: &CurrentUser) -> Result<Self, RegistryError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(RegistryError::MissingName);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner.id.clone(),
            name: name.to_string(),
            species: form.species,
            breed: non_blank(form.breed),
            age: non_blank(form.age),
            weight_kg: form.weight_kg,
            date_of_birth: form.date_of_birth,
            notes: non_blank(form.notes),
            health_status: HealthStatus::Healthy,
            created_at: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Species, UserRole};

    fn farmer() -> CurrentUser {
        CurrentUser {
            id: "f1".to_string(),
            name: "John Farmer".to_string(),
            role: UserRole::Farmer,
        }
    }

    #[test]
    fn new_animals_start_healthy() {
        let form = NewAnimal {
            name: " Gauri ".to_string(),
            species: Species::Cow,
            breed: Some("  ".to_string()),
            age: Some("3 years".to_string()),
            weight_kg: None,
            date_of_birth: None,
            notes: None,
        };
        let animal = Animal::register(form, &farmer()).unwrap();
        assert_eq!(animal.name, "Gauri");
        assert_eq!(animal.owner_id, "f1");
        assert_eq!(animal.breed, None);
        assert_eq!(animal.health_status, HealthStatus::Healthy);
    }

    #[test]
    fn blank_name_is_refused() {
        let form = NewAnimal {
            name: String::new(),
            species: Species::Goat,
            breed: None,
            age: None,
            weight_kg: None,
            date_of_birth: None,
            notes: None,
        };
        assert_eq!(
            Animal::register(form, &farmer()).unwrap_err(),
            RegistryError::MissingName
        );
    }
}
