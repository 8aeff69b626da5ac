use std::cmp::Ordering;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, BookingConstraint, BookingRequest, BookingStatus, Veterinarian};

pub const AVAILABLE_DAYS: usize = 7;

pub const SPECIALIZATIONS: [&str; 5] = [
    "Ruminants",
    "Poultry",
    "Swine",
    "Equine",
    "General Practice",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("no veterinarian selected")]
    MissingVeterinarian,
    #[error("no appointment date selected")]
    MissingDate,
    #[error("no time slot selected")]
    MissingSlot,
    #[error("request names veterinarian {requested} but record is {actual}")]
    VeterinarianMismatch { requested: String, actual: String },
    #[error("slot {slot} is not offered by this veterinarian")]
    SlotUnavailable { slot: String },
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingVeterinarian => "missing_veterinarian",
            Self::MissingDate => "missing_date",
            Self::MissingSlot => "missing_slot",
            Self::VeterinarianMismatch { .. } => "veterinarian_mismatch",
            Self::SlotUnavailable { .. } => "slot_unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderOrder {
    #[default]
    AsListed,
    RatingDesc,
    FeeAsc,
    ExperienceDesc,
}

impl ProviderOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "listed" | "as_listed" => Some(Self::AsListed),
            "rating" | "rating_desc" => Some(Self::RatingDesc),
            "fee" | "fee_asc" => Some(Self::FeeAsc),
            "experience" | "experience_desc" => Some(Self::ExperienceDesc),
            _ => None,
        }
    }
}

impl BookingConstraint {
    pub fn matches(&self, vet: &Veterinarian) -> bool {
        contains_folded(&vet.specialization, &self.specialization)
            && within_fee(vet.appointment_fee, &self.max_fee)
            && contains_folded(&vet.location, &self.location)
    }
}

/// Keeps the providers that satisfy every constraint, in input order.
pub fn filter(providers: &[Veterinarian], constraint: &BookingConstraint) -> Vec<Veterinarian> {
    providers
        .iter()
        .filter(|vet| constraint.matches(vet))
        .cloned()
        .collect()
}

pub fn rank(mut providers: Vec<Veterinarian>, order: ProviderOrder) -> Vec<Veterinarian> {
    match order {
        ProviderOrder::AsListed => {}
        ProviderOrder::RatingDesc => providers.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
        }),
        ProviderOrder::FeeAsc => providers.sort_by_key(|vet| vet.appointment_fee),
        ProviderOrder::ExperienceDesc => {
            providers.sort_by_key(|vet| std::cmp::Reverse(vet.experience_years()))
        }
    }
    providers
}

pub fn book(request: &BookingRequest, vet: &Veterinarian) -> Result<Booking, BookingError> {
    validate(request, vet)?;

    Ok(Booking {
        id: Uuid::new_v4().to_string(),
        veterinarian_id: vet.id.clone(),
        animal_id: request.animal_id.trim().to_string(),
        date: request.date.trim().to_string(),
        time_slot: request.time_slot.clone(),
        fee: vet.appointment_fee,
        status: BookingStatus::Confirmed,
        created_at: Utc::now(),
    })
}

pub fn validate(request: &BookingRequest, vet: &Veterinarian) -> Result<(), BookingError> {
    let requested = request.veterinarian_id.trim();
    if requested.is_empty() {
        return Err(BookingError::MissingVeterinarian);
    }
    if request.date.trim().is_empty() {
        return Err(BookingError::MissingDate);
    }
    if request.time_slot.trim().is_empty() {
        return Err(BookingError::MissingSlot);
    }
    if requested != vet.id {
        return Err(BookingError::VeterinarianMismatch {
            requested: requested.to_string(),
            actual: vet.id.clone(),
        });
    }
    if !vet.offers_slot(&request.time_slot) {
        return Err(BookingError::SlotUnavailable {
            slot: request.time_slot.clone(),
        });
    }
    Ok(())
}

/// The seven calendar days after `today`, ascending. Weekends are included.
pub fn available_dates_from(today: NaiveDate) -> Vec<NaiveDate> {
    today.iter_days().skip(1).take(AVAILABLE_DAYS).collect()
}

pub fn available_dates() -> Vec<NaiveDate> {
    available_dates_from(Local::now().date_naive())
}

/// Reads a fee ceiling the way a form field is read: leading integer, anything else is unbounded.
pub fn parse_fee_ceiling(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: String = rest.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

fn within_fee(fee: u32, max_fee: &str) -> bool {
    match parse_fee_ceiling(max_fee) {
        Some(ceiling) => i64::from(fee) <= ceiling,
        None => true,
    }
}

/// A blank needle is a wildcard; otherwise the needle is matched as typed, spaces included.
fn contains_folded(haystack: &str, needle: &str) -> bool {
    needle.trim().is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
