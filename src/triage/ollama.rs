use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ClassifierError, SpecialtyClassifier};

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default triage model.
pub const DEFAULT_TRIAGE_MODEL: &str = "llama3";

const TRIAGE_SYSTEM_PROMPT: &str = "You are a medical triage assistant. \
Given a patient's symptoms, answer with ONLY the medical specialty name. \
No explanation.";

/// Ollama-backed specialty classifier.
pub struct OllamaTriageClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaTriageClient {
    /// Create a client with a request timeout. Every call is bounded by it.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, ClassifierError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClassifierError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    /// Local instance at localhost:11434 with the default model and 60s timeout.
    pub fn default_local() -> Result<Self, ClassifierError> {
        Self::new(DEFAULT_OLLAMA_URL, DEFAULT_TRIAGE_MODEL, 60)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Build the triage prompt for a symptom description.
pub fn build_triage_prompt(symptom_text: &str) -> String {
    format!(
        "Symptoms: {}\n\nOutput format example:\nCardiologist,Dermatologist,Gynecologist",
        symptom_text.trim()
    )
}

impl SpecialtyClassifier for OllamaTriageClient {
    fn predict(&self, symptom_text: &str) -> Result<String, ClassifierError> {
        let url = format!("{}/api/generate", self.base_url);
        let prompt = build_triage_prompt(symptom_text);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &prompt,
            system: TRIAGE_SYSTEM_PROMPT,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassifierError::OllamaConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    ClassifierError::Timeout(Duration::from_secs(self.timeout_secs))
                } else {
                    ClassifierError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifierError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| ClassifierError::ResponseParsing(e.to_string()))?;

        tracing::debug!(model = %self.model, raw = %parsed.response, "Ollama triage answered");
        Ok(parsed.response)
    }
}
