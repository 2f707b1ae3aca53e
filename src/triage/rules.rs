/// Specialty returned when no keyword matches.
pub const FALLBACK_SPECIALTY: &str = "General Physician";

/// Ordered keyword table. The first row with any keyword contained in the
/// lower-cased text wins, so "chest pain with a rash" is cardiology.
pub const SPECIALTY_RULES: &[(&[&str], &str)] = &[
    (&["chest", "heart", "bp"], "Cardiologist"),
    (&["skin", "rash", "itch", "allergy"], "Dermatologist"),
    (&["cough", "cold", "fever"], "Physician"),
];

/// Classify symptom text using the keyword table. Total: never fails, never empty.
pub fn classify_symptoms(text: &str) -> &'static str {
    let lower = text.to_lowercase();

    SPECIALTY_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, specialty)| *specialty)
        .unwrap_or(FALLBACK_SPECIALTY)
}
