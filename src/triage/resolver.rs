use serde::Serialize;

use super::rules::classify_symptoms;
use super::{predict_guarded, ClassifierError, SpecialtyClassifier};
use crate::models::ClassificationSource;

/// Outcome of specialty resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialtyResolution {
    pub specialty: String,
    pub source: ClassificationSource,
}

/// Take the first candidate of a raw classifier answer.
///
/// `"Cardiologist, Internist"` gives `"Cardiologist"`. Newlines separate
/// candidates the same way commas do. Blank answers are an error.
pub fn first_candidate(raw: &str) -> Result<String, ClassifierError> {
    raw.split([',', '\n'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ClassifierError::EmptyPrediction)
}

/// Resolve a specialty: external classifier first, keyword table on any failure.
///
/// A panicking classifier counts as a failure. This call adds no deadline;
/// wrap slow classifiers in `TimeoutClassifier` (the scheduler always does).
pub fn resolve_specialty(
    classifier: Option<&dyn SpecialtyClassifier>,
    symptom_text: &str,
) -> SpecialtyResolution {
    if let Some(classifier) = classifier {
        match predict_guarded(classifier, symptom_text).and_then(|raw| first_candidate(&raw)) {
            Ok(specialty) => {
                tracing::info!(specialty = %specialty, "classifier predicted specialty");
                return SpecialtyResolution {
                    specialty,
                    source: ClassificationSource::Classifier,
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "classifier failed, falling back to rules");
            }
        }
    }

    let specialty = classify_symptoms(symptom_text).to_string();
    tracing::debug!(specialty = %specialty, "rule-based specialty");
    SpecialtyResolution {
        specialty,
        source: ClassificationSource::RuleBased,
    }
}
