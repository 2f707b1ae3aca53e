use chrono::NaiveDateTime;

use crate::models::{Appointment, DoctorId};

/// The `Scheduled` appointment holding `doctor` at exactly `at`, if any.
///
/// Appointments have no duration: only an identical instant conflicts.
/// Completed and cancelled appointments never hold a slot.
pub fn find_conflict(
    doctor: DoctorId,
    at: NaiveDateTime,
    appointments: &[Appointment],
) -> Option<&Appointment> {
    appointments
        .iter()
        .find(|a| a.doctor_id() == doctor && a.scheduled_at() == at && a.is_active())
}

pub fn is_available(doctor: DoctorId, at: NaiveDateTime, appointments: &[Appointment]) -> bool {
    find_conflict(doctor, at, appointments).is_none()
}
