//! Classifier doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use super::{ClassifierError, SpecialtyClassifier};

/// Returns a fixed answer, or a connection error, and counts calls.
pub struct StaticClassifier {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl StaticClassifier {
    pub fn answer(raw: &str) -> Self {
        Self {
            answer: Some(raw.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpecialtyClassifier for StaticClassifier {
    fn predict(&self, _symptom_text: &str) -> Result<String, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| ClassifierError::OllamaConnection("http://localhost:11434".into()))
    }
}

/// Sleeps before answering.
pub struct SlowClassifier {
    delay: Duration,
    answer: String,
}

impl SlowClassifier {
    pub fn new(delay: Duration, answer: &str) -> Self {
        Self {
            delay,
            answer: answer.to_string(),
        }
    }
}

impl SpecialtyClassifier for SlowClassifier {
    fn predict(&self, _symptom_text: &str) -> Result<String, ClassifierError> {
        thread::sleep(self.delay);
        Ok(self.answer.clone())
    }
}

pub struct PanickingClassifier;

impl SpecialtyClassifier for PanickingClassifier {
    fn predict(&self, _symptom_text: &str) -> Result<String, ClassifierError> {
        panic!("classifier blew up");
    }
}
