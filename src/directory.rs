//! In-memory registry of doctors and patients.
//!
//! Populated by an outside registration workflow before scheduling starts.
//! Entries are keyed by id; insertion order is kept because doctor lookup
//! by specialty returns the first registered match.

use thiserror::Error;

use crate::models::{Doctor, DoctorId, ModelError, Patient, PatientId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("{entity_type} already registered: {id}")]
    AlreadyRegistered { entity_type: &'static str, id: String },

    #[error("{entity_type} not registered: {id}")]
    NotRegistered { entity_type: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] ModelError),
}

#[derive(Debug, Default)]
pub struct Directory {
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_doctor(&mut self, doctor: Doctor) -> Result<DoctorId, DirectoryError> {
        let id = doctor.id();
        if self.doctor(id).is_some() {
            return Err(DirectoryError::AlreadyRegistered {
                entity_type: "Doctor",
                id: id.to_string(),
            });
        }
        tracing::info!(doctor = %id, specialty = %doctor.specialty(), "doctor registered");
        self.doctors.push(doctor);
        Ok(id)
    }

    pub fn register_patient(&mut self, patient: Patient) -> Result<PatientId, DirectoryError> {
        let id = patient.id();
        if self.patient(id).is_some() {
            return Err(DirectoryError::AlreadyRegistered {
                entity_type: "Patient",
                id: id.to_string(),
            });
        }
        tracing::info!(patient = %id, "patient registered");
        self.patients.push(patient);
        Ok(id)
    }

    pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id() == id)
    }

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id() == id)
    }

    pub fn patient_mut(&mut self, id: PatientId) -> Option<&mut Patient> {
        self.patients.iter_mut().find(|p| p.id() == id)
    }

    pub fn contains_doctor(&self, id: DoctorId) -> bool {
        self.doctor(id).is_some()
    }

    pub fn contains_patient(&self, id: PatientId) -> bool {
        self.patient(id).is_some()
    }

    /// First registered doctor whose specialty matches, ignoring case and padding.
    pub fn find_doctor_by_specialty(&self, specialty: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.has_specialty(specialty))
    }

    /// First registered doctor with this display name. Names are not unique.
    pub fn find_doctor_by_name(&self, name: &str) -> Option<&Doctor> {
        let name = name.trim();
        self.doctors.iter().find(|d| d.name() == name)
    }

    /// Reassign a registered doctor's specialty (normalized like at creation).
    pub fn set_doctor_specialty(&mut self, id: DoctorId, specialty: &str) -> Result<(), DirectoryError> {
        let doctor = self
            .doctors
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or_else(|| DirectoryError::NotRegistered {
                entity_type: "Doctor",
                id: id.to_string(),
            })?;
        doctor.set_specialty(specialty)?;
        Ok(())
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }
}
