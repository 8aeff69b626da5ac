use serde_json::json;

use crate::models::{DiagnosisVerdict, Severity, SuggestedAction};

pub fn welcome_message(animal_name: Option<&str>) -> String {
    let name = animal_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("your animal");

    format!(
        "Hello! I'm your veterinary assistant. I'm here to help you with {name}'s health concerns. Please describe the symptoms you're observing."
    )
}

pub fn render_assessment(verdict: &DiagnosisVerdict) -> String {
    let conditions = bullet_list(&verdict.possible_conditions);
    let recommendations = bullet_list(&verdict.recommendations);

    format!(
        "Based on the symptoms you described, here's my assessment:\n\n\
         **Possible Conditions:**\n{conditions}\n\n\
         **Severity Level:** {}\n\n\
         **Recommendations:**\n{recommendations}\n\n\
         **Urgency:** {}\n\n\
         Would you like me to help you book an appointment with a veterinarian?",
        verdict.severity_label, verdict.urgency
    )
}

/// Follow-up actions offered after an assessment.
pub fn suggested_actions(verdict: &DiagnosisVerdict, animal_id: Option<&str>) -> Vec<SuggestedAction> {
    let mut actions = Vec::new();

    if verdict.severity >= Severity::Medium {
        actions.push(SuggestedAction {
            action_type: "book_veterinarian".to_string(),
            label: "Book a veterinarian".to_string(),
            payload: json!({
                "animal_id": animal_id,
                "severity": verdict.severity,
            }),
        });
    }

    actions.push(SuggestedAction {
        action_type: "new_consultation".to_string(),
        label: "Start a new consultation".to_string(),
        payload: json!({ "animal_id": animal_id }),
    });

    actions
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("• {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triage::diagnose;

    #[test]
    fn greeting_falls_back_to_generic_name() {
        assert!(welcome_message(None).contains("your animal's health"));
        assert!(welcome_message(Some("Gauri")).contains("Gauri's health"));
    }

    #[test]
    fn assessment_lists_every_condition() {
        let verdict = diagnose("coughing");
        let text = render_assessment(&verdict);
        assert!(text.contains("• Pneumonia"));
        assert!(text.contains("**Severity Level:** High"));
    }

    #[test]
    fn low_severity_does_not_push_booking() {
        let actions = suggested_actions(&diagnose("seems quiet"), None);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, "new_consultation");
    }
}
