use thiserror::Error;

use crate::models::{DiagnosisVerdict, RuleTag, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymptomMatcher {
    /// Every needle must appear.
    All(&'static [&'static str]),
    /// At least one needle must appear.
    Any(&'static [&'static str]),
    Always,
}

impl SymptomMatcher {
    fn matches(&self, lower: &str) -> bool {
        match self {
            Self::All(needles) => needles.iter().all(|needle| lower.contains(needle)),
            Self::Any(needles) => contains_any(lower, needles),
            Self::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriageRule {
    pub tag: RuleTag,
    pub matcher: SymptomMatcher,
    pub severity: Severity,
    pub severity_label: &'static str,
    pub conditions: &'static [&'static str],
    pub recommendations: &'static [&'static str],
    pub urgency: &'static str,
}

impl TriageRule {
    pub fn verdict(&self) -> DiagnosisVerdict {
        DiagnosisVerdict {
            rule: self.tag,
            possible_conditions: self.conditions.iter().map(ToString::to_string).collect(),
            severity: self.severity,
            severity_label: self.severity_label.to_string(),
            recommendations: self
                .recommendations
                .iter()
                .map(ToString::to_string)
                .collect(),
            urgency: self.urgency.to_string(),
        }
    }
}

pub const FEVER_APPETITE: TriageRule = TriageRule {
    tag: RuleTag::FeverAppetite,
    matcher: SymptomMatcher::All(&["fever", "loss of appetite"]),
    severity: Severity::Medium,
    severity_label: "Medium",
    conditions: &[
        "Bacterial infection",
        "Viral infection",
        "Parasitic infection",
    ],
    recommendations: &[
        "Monitor temperature regularly",
        "Ensure adequate hydration",
        "Isolate from other animals if possible",
        "Contact a veterinarian if symptoms persist for more than 24 hours",
    ],
    urgency: "Schedule vet appointment within 24-48 hours",
};

// Displayed as a range; ranked as Medium.
pub const LAMENESS: TriageRule = TriageRule {
    tag: RuleTag::Lameness,
    matcher: SymptomMatcher::Any(&["limping", "lameness"]),
    severity: Severity::Medium,
    severity_label: "Low to Medium",
    conditions: &["Injury", "Joint inflammation", "Hoof problems"],
    recommendations: &[
        "Rest the animal",
        "Check for visible injuries",
        "Keep the area clean and dry",
        "Avoid strenuous activity",
    ],
    urgency: "Monitor for 24-48 hours, contact vet if no improvement",
};

pub const DIGESTIVE: TriageRule = TriageRule {
    tag: RuleTag::Digestive,
    matcher: SymptomMatcher::Any(&["diarrhea", "loose stool"]),
    severity: Severity::Medium,
    severity_label: "Medium",
    conditions: &["Gastrointestinal infection", "Dietary changes", "Parasites"],
    recommendations: &[
        "Ensure clean drinking water",
        "Monitor for dehydration",
        "Consider dietary adjustments",
        "Keep the animal in a clean environment",
    ],
    urgency: "Contact vet if diarrhea persists for more than 24 hours",
};

pub const RESPIRATORY: TriageRule = TriageRule {
    tag: RuleTag::Respiratory,
    matcher: SymptomMatcher::Any(&["coughing", "breathing difficulty"]),
    severity: Severity::High,
    severity_label: "High",
    conditions: &["Respiratory infection", "Allergies", "Pneumonia"],
    recommendations: &[
        "Ensure good ventilation",
        "Keep the animal in a dust-free environment",
        "Monitor breathing rate",
        "Contact veterinarian immediately",
    ],
    urgency: "Contact vet immediately - respiratory issues can be serious",
};

pub const GENERAL: TriageRule = TriageRule {
    tag: RuleTag::General,
    matcher: SymptomMatcher::Always,
    severity: Severity::Low,
    severity_label: "Low",
    conditions: &["General health concern", "Stress-related issues"],
    recommendations: &[
        "Monitor the animal closely",
        "Ensure proper nutrition and hydration",
        "Maintain clean living conditions",
        "Contact a veterinarian for proper diagnosis",
    ],
    urgency: "Schedule vet appointment for proper evaluation",
};

/// Checked top to bottom; the first match wins.
pub static STANDARD_RULES: [TriageRule; 5] =
    [FEVER_APPETITE, LAMENESS, DIGESTIVE, RESPIRATORY, GENERAL];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriageError {
    #[error("rule table must end with a catch-all rule")]
    MissingCatchAll,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("symptom description is empty")]
    Empty,
}

/// A symptom description that is known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomReport {
    text: String,
}

impl SymptomReport {
    pub fn new(text: &str) -> Result<Self, ReportError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReportError::Empty);
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriageEngine {
    rules: &'static [TriageRule],
    fallback: &'static TriageRule,
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl TriageEngine {
    pub fn standard() -> Self {
        Self {
            rules: &STANDARD_RULES,
            fallback: &GENERAL,
        }
    }

    /// Builds an engine over a custom table. The last rule must be `SymptomMatcher::Always`.
    pub fn with_rules(rules: &'static [TriageRule]) -> Result<Self, TriageError> {
        match rules.last() {
            Some(last) if last.matcher == SymptomMatcher::Always => Ok(Self {
                rules,
                fallback: last,
            }),
            _ => Err(TriageError::MissingCatchAll),
        }
    }

    pub fn rules(&self) -> &'static [TriageRule] {
        self.rules
    }

    pub fn matching_rule(&self, text: &str) -> &'static TriageRule {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(&lower))
            .unwrap_or(self.fallback)
    }

    pub fn diagnose(&self, text: &str) -> DiagnosisVerdict {
        self.matching_rule(text).verdict()
    }

    pub fn assess(&self, report: &SymptomReport) -> DiagnosisVerdict {
        self.diagnose(report.text())
    }
}

pub fn diagnose(text: &str) -> DiagnosisVerdict {
    TriageEngine::standard().diagnose(text)
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}
