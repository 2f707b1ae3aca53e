//! Symptom triage: maps free-text symptoms to a doctor specialty.
//!
//! An optional external classifier (`SpecialtyClassifier`) is consulted first.
//! Whatever it does wrong (unreachable, slow, blank, garbage) is swallowed and
//! the keyword table in `rules` answers instead.

pub mod ollama;
pub mod resolver;
pub mod rules;
pub mod timeout;

#[cfg(test)]
pub(crate) mod testing;

pub use ollama::*;
pub use resolver::*;
pub use rules::*;
pub use timeout::*;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use thiserror::Error;

/// Failures of the external classifier. Never leaves this crate's scheduler:
/// every variant triggers the rule-based fallback.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Classifier returned no specialty")]
    EmptyPrediction,

    #[error("Classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Classifier has {0} calls still running")]
    Busy(usize),

    #[error("Classifier panicked: {0}")]
    Panicked(String),

    #[error("Classifier worker stopped: {0}")]
    Worker(String),
}

/// Port for an external symptom-to-specialty classifier.
///
/// The raw answer may list several candidates separated by commas; the
/// resolver keeps the first one.
pub trait SpecialtyClassifier: Send + Sync {
    fn predict(&self, symptom_text: &str) -> Result<String, ClassifierError>;
}

/// Call `classifier`, turning a panic into `ClassifierError::Panicked`.
pub(crate) fn predict_guarded(
    classifier: &dyn SpecialtyClassifier,
    symptom_text: &str,
) -> Result<String, ClassifierError> {
    panic::catch_unwind(AssertUnwindSafe(|| classifier.predict(symptom_text)))
        .unwrap_or_else(|payload| Err(ClassifierError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
