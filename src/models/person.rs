use serde::{Deserialize, Serialize};

use super::ModelError;

/// Anything the clinic can print a one-line summary of.
pub trait Describable {
    fn describe(&self) -> String;
}

/// Identity fields shared by doctors and patients, embedded by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    name: String,
    age: u32,
    contact: Option<String>,
}

impl PersonInfo {
    /// Validates name (non-blank) and age (> 0). The name is stored trimmed.
    pub fn new(name: &str, age: u32, contact: Option<&str>) -> Result<Self, ModelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName);
        }
        if age == 0 {
            return Err(ModelError::InvalidAge(age));
        }
        let contact = contact
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            age,
            contact,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }
}
