pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod ids;
pub mod patient;
pub mod person;

pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use ids::*;
pub use patient::*;
pub use person::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Age must be positive, got {0}")]
    InvalidAge(u32),

    #[error("Specialty cannot be empty")]
    EmptySpecialty,

    #[error("Symptom cannot be empty")]
    EmptySymptom,

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
}
