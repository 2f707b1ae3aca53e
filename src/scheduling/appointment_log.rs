//! Append-only appointment log.
//!
//! The log is both the schedule of record and the source for conflict
//! detection. `reserve` checks availability and appends under one lock, so two
//! callers racing for the same (doctor, instant) cannot both succeed.

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use super::availability::find_conflict;
use super::SchedulingError;
use crate::models::{Appointment, AppointmentId, DoctorId, ModelError};

/// Result of an atomic availability-check-and-append.
#[derive(Debug, Clone, PartialEq)]
pub enum Reservation {
    Booked(Appointment),
    /// The slot is held by this appointment; nothing was appended.
    Conflict(AppointmentId),
}

#[derive(Debug, Default)]
pub struct AppointmentLog {
    entries: Mutex<Vec<Appointment>>,
}

impl AppointmentLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Appointment>>, SchedulingError> {
        self.entries.lock().map_err(|_| SchedulingError::LockPoisoned)
    }

    /// Append `appointment` unless its doctor already has a scheduled
    /// appointment at the same instant.
    pub fn reserve(&self, appointment: Appointment) -> Result<Reservation, SchedulingError> {
        let mut entries = self.lock()?;

        if let Some(existing) = find_conflict(
            appointment.doctor_id(),
            appointment.scheduled_at(),
            &entries,
        ) {
            return Ok(Reservation::Conflict(existing.id()));
        }

        entries.push(appointment.clone());
        Ok(Reservation::Booked(appointment))
    }

    pub fn is_available(&self, doctor: DoctorId, at: NaiveDateTime) -> Result<bool, SchedulingError> {
        let entries = self.lock()?;
        Ok(find_conflict(doctor, at, &entries).is_none())
    }

    pub fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, SchedulingError> {
        let entries = self.lock()?;
        Ok(entries.iter().find(|a| a.id() == id).cloned())
    }

    /// Copy of every entry in append order.
    pub fn snapshot(&self) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.lock()?.clone())
    }

    pub fn for_doctor(&self, doctor: DoctorId) -> Result<Vec<Appointment>, SchedulingError> {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|a| a.doctor_id() == doctor)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, SchedulingError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SchedulingError> {
        Ok(self.lock()?.is_empty())
    }

    pub fn complete(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.update(id, Appointment::complete)
    }

    pub fn cancel(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.update(id, Appointment::cancel)
    }

    fn update(
        &self,
        id: AppointmentId,
        apply: fn(&mut Appointment) -> Result<(), ModelError>,
    ) -> Result<Appointment, SchedulingError> {
        let mut entries = self.lock()?;
        let appointment = entries
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(SchedulingError::AppointmentNotFound(id))?;
        apply(appointment)?;
        Ok(appointment.clone())
    }
}
