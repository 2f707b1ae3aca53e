use serde::{Deserialize, Serialize};

use super::ids::DoctorId;
use super::person::{Describable, PersonInfo};
use super::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    id: DoctorId,
    person: PersonInfo,
    specialty: String,
}

impl Doctor {
    pub fn new(
        name: &str,
        age: u32,
        specialty: &str,
        contact: Option<&str>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            id: DoctorId::new(),
            person: PersonInfo::new(name, age, contact)?,
            specialty: normalize_specialty(specialty)?,
        })
    }

    pub fn id(&self) -> DoctorId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.person.name()
    }

    pub fn person(&self) -> &PersonInfo {
        &self.person
    }

    pub fn specialty(&self) -> &str {
        &self.specialty
    }

    /// Reassign the specialty. The old value is kept if the new one is blank.
    pub fn set_specialty(&mut self, specialty: &str) -> Result<(), ModelError> {
        self.specialty = normalize_specialty(specialty)?;
        Ok(())
    }

    /// Case-insensitive, whitespace-trimmed comparison. No synonym handling:
    /// "Cardiology" does not match "Cardiologist".
    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialty.to_lowercase() == specialty.trim().to_lowercase()
    }
}

impl Describable for Doctor {
    fn describe(&self) -> String {
        format!(
            "{}, age {}, is a {} doctor.",
            self.name(),
            self.person.age(),
            self.specialty
        )
    }
}

/// Trim, collapse inner whitespace and title-case every word.
pub fn normalize_specialty(raw: &str) -> Result<String, ModelError> {
    let words: Vec<String> = raw.split_whitespace().map(title_case_word).collect();
    if words.is_empty() {
        return Err(ModelError::EmptySpecialty);
    }
    Ok(words.join(" "))
}

fn title_case_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
