use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Tag naming which triage rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTag {
    FeverAppetite,
    Lameness,
    Digestive,
    Respiratory,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisVerdict {
    pub rule: RuleTag,
    pub possible_conditions: Vec<String>,
    pub severity: Severity,
    pub severity_label: String,
    pub recommendations: Vec<String>,
    pub urgency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Veterinarian {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub qualification: String,
    pub specialization: String,
    pub experience: String,
    pub rating: f32,
    pub appointment_fee: u32,
    pub location: String,
    pub clinic_address: String,
    pub available_slots: Vec<String>,
}

impl Veterinarian {
    /// Leading integer of the experience text, e.g. `"15 years"` -> 15.
    pub fn experience_years(&self) -> u32 {
        let digits: String = self
            .experience
            .trim_start()
            .chars()
            .take_while(|ch| ch.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0)
    }

    pub fn offers_slot(&self, slot: &str) -> bool {
        self.available_slots.iter().any(|candidate| candidate == slot)
    }
}

/// Farmer-supplied filter over the veterinarian directory. Empty fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingConstraint {
    pub specialization: String,
    pub max_fee: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub veterinarian_id: String,
    pub animal_id: String,
    pub date: String,
    pub time_slot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Rejected,
}

impl BookingStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "confirmed" => Some(Self::Confirmed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub veterinarian_id: String,
    pub animal_id: String,
    pub date: String,
    pub time_slot: String,
    pub fee: u32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    Cow,
    Goat,
    Buffalo,
    Sheep,
    Pig,
}

impl Species {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "cow" | "cattle" => Some(Self::Cow),
            "goat" => Some(Self::Goat),
            "buffalo" => Some(Self::Buffalo),
            "sheep" => Some(Self::Sheep),
            "pig" | "swine" => Some(Self::Pig),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    NeedsAttention,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnimal {
    pub name: String,
    pub species: Species,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f32>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: Species,
    pub breed: Option<String>,
    pub age: Option<String>,
    pub weight_kg: Option<f32>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    pub health_status: HealthStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Veterinarian,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRecord {
    pub id: String,
    pub animal_id: Option<String>,
    pub symptoms: String,
    pub verdict: DiagnosisVerdict,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub action_type: String,
    pub label: String,
    pub payload: Value,
}
