pub mod availability;
pub mod appointment_log;
pub mod scheduler;

pub use availability::*;
pub use appointment_log::*;
pub use scheduler::*;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::{AppointmentId, AppointmentStatus, ModelError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("{entity_type} not registered: {id}")]
    NotRegistered { entity_type: &'static str, id: String },

    #[error("Doctor {doctor} is not available at {at} (held by appointment {conflicting})")]
    DoctorUnavailable {
        doctor: String,
        at: NaiveDateTime,
        conflicting: AppointmentId,
    },

    #[error("No doctor found for specialty: {0}")]
    NoDoctorForSpecialty(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),

    #[error("Validation failed: {0}")]
    Validation(ModelError),

    #[error("Internal lock error")]
    LockPoisoned,
}

impl From<ModelError> for SchedulingError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            other => Self::Validation(other),
        }
    }
}
