use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::ids::{AppointmentId, DoctorId, PatientId};
use super::ModelError;

/// Display format used in appointment summaries, e.g. `11-Nov-2025 14:30`.
pub const DISPLAY_FORMAT: &str = "%d-%b-%Y %H:%M";

/// A booking between a registered doctor and a registered patient.
///
/// Holds ids only; the people themselves stay in the directory. Status moves
/// `Scheduled -> Completed` or `Scheduled -> Cancelled` and never back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,
    doctor_id: DoctorId,
    patient_id: PatientId,
    scheduled_at: NaiveDateTime,
    status: AppointmentStatus,
    /// Symptom text the booking was made from, if any.
    symptoms: Option<String>,
    /// Specialty resolved from `symptoms`.
    specialty: Option<String>,
    created_at: NaiveDateTime,
}

impl Appointment {
    /// Callers are responsible for checking that both ids are registered;
    /// the scheduler is the only constructor in practice.
    pub(crate) fn new(doctor_id: DoctorId, patient_id: PatientId, scheduled_at: NaiveDateTime) -> Self {
        Self {
            id: AppointmentId::new(),
            doctor_id,
            patient_id,
            scheduled_at,
            status: AppointmentStatus::Scheduled,
            symptoms: None,
            specialty: None,
            created_at: Local::now().naive_local(),
        }
    }

    pub(crate) fn with_triage(mut self, symptoms: &str, specialty: &str) -> Self {
        self.symptoms = Some(symptoms.trim().to_string());
        self.specialty = Some(specialty.to_string());
        self
    }

    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn doctor_id(&self) -> DoctorId {
        self.doctor_id
    }

    pub fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.scheduled_at
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn symptoms(&self) -> Option<&str> {
        self.symptoms.as_deref()
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// True while the slot is held.
    pub fn is_active(&self) -> bool {
        self.status == AppointmentStatus::Scheduled
    }

    pub fn complete(&mut self) -> Result<(), ModelError> {
        self.transition(AppointmentStatus::Completed)
    }

    pub fn cancel(&mut self) -> Result<(), ModelError> {
        self.transition(AppointmentStatus::Cancelled)
    }

    fn transition(&mut self, to: AppointmentStatus) -> Result<(), ModelError> {
        if self.status == to {
            tracing::debug!(appointment = %self.id, status = %to, "transition already applied");
            return Ok(());
        }
        if self.status.is_terminal() {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        tracing::info!(appointment = %self.id, from = %self.status, to = %to, "appointment status changed");
        self.status = to;
        Ok(())
    }

    /// Summary line given the display names of both parties.
    pub fn describe_with(&self, doctor_name: &str, patient_name: &str) -> String {
        format!(
            "Appointment: {} with Dr. {} on {} [{}]",
            patient_name,
            doctor_name,
            self.scheduled_at.format(DISPLAY_FORMAT),
            self.status
        )
    }
}
