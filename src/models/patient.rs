use serde::{Deserialize, Serialize};

use super::ids::PatientId;
use super::person::{Describable, PersonInfo};
use super::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    id: PatientId,
    person: PersonInfo,
    symptoms: Vec<String>,
    bill_total: f64,
}

impl Patient {
    /// Blank symptom entries are dropped, the rest are normalized in order.
    pub fn new<I, S>(
        name: &str,
        age: u32,
        contact: Option<&str>,
        symptoms: I,
    ) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            id: PatientId::new(),
            person: PersonInfo::new(name, age, contact)?,
            symptoms: symptoms
                .into_iter()
                .filter_map(|s| normalize_symptom(s.as_ref()))
                .collect(),
            bill_total: 0.0,
        })
    }

    /// Free-text complaint such as "Chest pain, fever" becomes two symptoms.
    pub fn with_complaint(
        name: &str,
        age: u32,
        contact: Option<&str>,
        complaint: &str,
    ) -> Result<Self, ModelError> {
        Self::new(name, age, contact, complaint.split(','))
    }

    /// Start with an outstanding balance.
    pub fn with_opening_balance(mut self, amount: f64) -> Result<Self, ModelError> {
        self.add_bill_amount(amount)?;
        Ok(self)
    }

    pub fn id(&self) -> PatientId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.person.name()
    }

    pub fn person(&self) -> &PersonInfo {
        &self.person
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn add_symptom(&mut self, symptom: &str) -> Result<(), ModelError> {
        let symptom = normalize_symptom(symptom).ok_or(ModelError::EmptySymptom)?;
        self.symptoms.push(symptom);
        Ok(())
    }

    pub fn bill_total(&self) -> f64 {
        self.bill_total
    }

    pub fn add_bill_amount(&mut self, amount: f64) -> Result<(), ModelError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ModelError::InvalidAmount(amount));
        }
        self.bill_total += amount;
        Ok(())
    }

    pub fn bill_summary(&self) -> String {
        format!("Bill amount of {} is ₹{:.2}", self.name(), self.bill_total)
    }
}

impl Describable for Patient {
    fn describe(&self) -> String {
        let symptoms = if self.symptoms.is_empty() {
            "No symptoms".to_string()
        } else {
            self.symptoms.join(", ")
        };
        format!(
            "Patient {}, Age {}, Symptoms: {}",
            self.name(),
            self.person.age(),
            symptoms
        )
    }
}

/// Trim, upper-case the first letter and lower-case the rest.
fn normalize_symptom(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    )
}
