//! Scheduler: request -> [classifier -> specialty] -> doctor -> availability -> booking.
//!
//! Directory, appointment log and classifier are injected. Availability check
//! and append happen inside `AppointmentLog::reserve`; specialty resolution
//! and doctor lookup run before it without holding any lock.

use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Duration;

use chrono::NaiveDateTime;

use super::appointment_log::{AppointmentLog, Reservation};
use super::SchedulingError;
use crate::config::SchedulerConfig;
use crate::directory::Directory;
use crate::models::{Appointment, AppointmentId, DoctorId, PatientId};
use crate::triage::{
    resolve_specialty, OllamaTriageClient, SpecialtyClassifier, SpecialtyResolution,
    TimeoutClassifier, DEFAULT_CLASSIFIER_TIMEOUT,
};

pub struct Scheduler {
    directory: Arc<RwLock<Directory>>,
    log: Arc<AppointmentLog>,
    classifier: Option<TimeoutClassifier>,
}

impl Scheduler {
    /// The classifier, if any, is always called under a deadline
    /// (`DEFAULT_CLASSIFIER_TIMEOUT` until `with_classifier_timeout` says otherwise).
    pub fn new(
        directory: Arc<RwLock<Directory>>,
        log: Arc<AppointmentLog>,
        classifier: Option<Arc<dyn SpecialtyClassifier>>,
    ) -> Self {
        Self {
            directory,
            log,
            classifier: classifier
                .map(|inner| TimeoutClassifier::new(inner, DEFAULT_CLASSIFIER_TIMEOUT)),
        }
    }

    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier = self.classifier.map(|c| c.with_timeout(timeout));
        self
    }

    /// Build a scheduler with a bounded Ollama classifier when `use_ai` is set.
    ///
    /// An Ollama client that cannot be built is logged and left out; the
    /// keyword rules still answer.
    pub fn from_config(
        config: &SchedulerConfig,
        directory: Arc<RwLock<Directory>>,
        log: Arc<AppointmentLog>,
    ) -> Self {
        let classifier = if config.use_ai {
            match OllamaTriageClient::new(
                &config.ollama_url,
                &config.ollama_model,
                config.classifier_timeout_secs,
            ) {
                Ok(client) => {
                    tracing::info!(
                        url = %config.ollama_url,
                        model = %config.ollama_model,
                        "Ollama triage enabled"
                    );
                    Some(Arc::new(client) as Arc<dyn SpecialtyClassifier>)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ollama triage unavailable, using rules only");
                    None
                }
            }
        } else {
            None
        };

        Self::new(directory, log, classifier)
            .with_classifier_timeout(Duration::from_secs(config.classifier_timeout_secs))
    }

    pub fn directory(&self) -> &Arc<RwLock<Directory>> {
        &self.directory
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Deadline applied to each classifier call, if a classifier is set.
    pub fn classifier_timeout(&self) -> Option<Duration> {
        self.classifier.as_ref().map(TimeoutClassifier::timeout)
    }

    fn read_directory(&self) -> Result<RwLockReadGuard<'_, Directory>, SchedulingError> {
        self.directory.read().map_err(|_| SchedulingError::LockPoisoned)
    }

    /// Book `doctor` for `patient` at `at`.
    pub fn schedule(
        &self,
        doctor: DoctorId,
        patient: PatientId,
        at: NaiveDateTime,
    ) -> Result<Appointment, SchedulingError> {
        let doctor_name = {
            let directory = self.read_directory()?;
            let name = registered_doctor_name(&directory, doctor)?;
            ensure_patient(&directory, patient)?;
            name
        };

        self.book(Appointment::new(doctor, patient, at), &doctor_name)
    }

    /// Book the first doctor whose specialty matches the patient's symptoms.
    pub fn schedule_by_symptom(
        &self,
        patient: PatientId,
        symptom_text: &str,
        at: NaiveDateTime,
    ) -> Result<Appointment, SchedulingError> {
        ensure_patient(&*self.read_directory()?, patient)?;

        let resolution = self.resolve_specialty(symptom_text);

        let (doctor, doctor_name) = {
            let directory = self.read_directory()?;
            let found = directory
                .find_doctor_by_specialty(&resolution.specialty)
                .ok_or_else(|| SchedulingError::NoDoctorForSpecialty(resolution.specialty.clone()))?;
            (found.id(), found.name().to_string())
        };
        tracing::debug!(
            specialty = %resolution.specialty,
            source = %resolution.source,
            doctor = %doctor,
            "doctor resolved from symptoms"
        );

        let appointment =
            Appointment::new(doctor, patient, at).with_triage(symptom_text, &resolution.specialty);
        self.book(appointment, &doctor_name)
    }

    /// Specialty for a symptom description: classifier first, rules on failure.
    pub fn resolve_specialty(&self, symptom_text: &str) -> SpecialtyResolution {
        resolve_specialty(
            self.classifier.as_ref().map(|c| c as &dyn SpecialtyClassifier),
            symptom_text,
        )
    }

    fn book(&self, appointment: Appointment, doctor_name: &str) -> Result<Appointment, SchedulingError> {
        let at = appointment.scheduled_at();
        match self.log.reserve(appointment)? {
            Reservation::Booked(appointment) => {
                tracing::info!(
                    appointment = %appointment.id(),
                    doctor = %appointment.doctor_id(),
                    patient = %appointment.patient_id(),
                    at = %at,
                    "appointment scheduled"
                );
                Ok(appointment)
            }
            Reservation::Conflict(conflicting) => {
                tracing::warn!(doctor = %doctor_name, at = %at, %conflicting, "doctor unavailable");
                Err(SchedulingError::DoctorUnavailable {
                    doctor: doctor_name.to_string(),
                    at,
                    conflicting,
                })
            }
        }
    }

    pub fn complete(&self, appointment: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.log.complete(appointment)
    }

    pub fn cancel(&self, appointment: AppointmentId) -> Result<Appointment, SchedulingError> {
        self.log.cancel(appointment)
    }

    pub fn is_doctor_available(&self, doctor: DoctorId, at: NaiveDateTime) -> Result<bool, SchedulingError> {
        self.log.is_available(doctor, at)
    }

    pub fn appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, SchedulingError> {
        self.log.get(id)
    }

    /// Every appointment in booking order.
    pub fn appointments(&self) -> Result<Vec<Appointment>, SchedulingError> {
        self.log.snapshot()
    }

    pub fn appointments_for_doctor(&self, doctor: DoctorId) -> Result<Vec<Appointment>, SchedulingError> {
        self.log.for_doctor(doctor)
    }

    /// Human-readable line with both parties' names.
    pub fn describe(&self, appointment: &Appointment) -> Result<String, SchedulingError> {
        let directory = self.read_directory()?;
        let doctor = registered_doctor_name(&directory, appointment.doctor_id())?;
        let patient = directory
            .patient(appointment.patient_id())
            .ok_or_else(|| not_registered_patient(appointment.patient_id()))?;
        Ok(appointment.describe_with(&doctor, patient.name()))
    }
}

fn registered_doctor_name(directory: &Directory, id: DoctorId) -> Result<String, SchedulingError> {
    directory
        .doctor(id)
        .map(|d| d.name().to_string())
        .ok_or_else(|| SchedulingError::NotRegistered {
            entity_type: "Doctor",
            id: id.to_string(),
        })
}

fn ensure_patient(directory: &Directory, id: PatientId) -> Result<(), SchedulingError> {
    if directory.contains_patient(id) {
        Ok(())
    } else {
        Err(not_registered_patient(id))
    }
}

fn not_registered_patient(id: PatientId) -> SchedulingError {
    SchedulingError::NotRegistered {
        entity_type: "Patient",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, ClassificationSource, Doctor, Patient};
    use crate::triage::testing::{PanickingClassifier, SlowClassifier, StaticClassifier};
    use std::time::Instant;
    use chrono::NaiveDate;
    use std::sync::Barrier;
    use std::thread;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 11)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    struct Clinic {
        scheduler: Scheduler,
        log: Arc<AppointmentLog>,
        priya: DoctorId,
        ravi: PatientId,
    }

    fn clinic(classifier: Option<Arc<dyn SpecialtyClassifier>>) -> Clinic {
        let mut directory = Directory::new();
        let priya = directory
            .register_doctor(Doctor::new("Priya Sharma", 45, "Cardiologist", None).unwrap())
            .unwrap();
        let ravi = directory
            .register_patient(Patient::new("Ravi Kumar", 32, None, Vec::<String>::new()).unwrap())
            .unwrap();

        let log = Arc::new(AppointmentLog::new());
        let scheduler = Scheduler::new(Arc::new(RwLock::new(directory)), Arc::clone(&log), classifier);
        Clinic {
            scheduler,
            log,
            priya,
            ravi,
        }
    }

    fn add_doctor(clinic: &Clinic, name: &str, specialty: &str) -> DoctorId {
        clinic
            .scheduler
            .directory()
            .write()
            .unwrap()
            .register_doctor(Doctor::new(name, 50, specialty, None).unwrap())
            .unwrap()
    }

    fn add_patient(clinic: &Clinic, name: &str) -> PatientId {
        clinic
            .scheduler
            .directory()
            .write()
            .unwrap()
            .register_patient(Patient::new(name, 40, None, ["Fever"]).unwrap())
            .unwrap()
    }

    #[test]
    fn schedule_books_and_appends() {
        let c = clinic(None);
        let appt = c.scheduler.schedule(c.priya, c.ravi, at(14, 30)).unwrap();

        assert_eq!(appt.status(), AppointmentStatus::Scheduled);
        assert_eq!(appt.doctor_id(), c.priya);
        assert_eq!(appt.patient_id(), c.ravi);
        assert_eq!(c.log.len().unwrap(), 1);
        assert!(!c.scheduler.is_doctor_available(c.priya, at(14, 30)).unwrap());
    }

    #[test]
    fn unregistered_doctor_is_rejected_without_append() {
        let c = clinic(None);
        let err = c.scheduler.schedule(DoctorId::new(), c.ravi, at(9, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::NotRegistered { entity_type: "Doctor", .. }));
        assert!(c.log.is_empty().unwrap());
    }

    #[test]
    fn unregistered_patient_is_rejected_without_append() {
        let c = clinic(None);
        let err = c.scheduler.schedule(c.priya, PatientId::new(), at(9, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::NotRegistered { entity_type: "Patient", .. }));

        let err = c
            .scheduler
            .schedule_by_symptom(PatientId::new(), "chest pain", at(9, 0))
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotRegistered { entity_type: "Patient", .. }));
        assert!(c.log.is_empty().unwrap());
    }

    #[test]
    fn unregistered_patient_never_reaches_classifier() {
        let classifier = Arc::new(StaticClassifier::answer("Cardiologist"));
        let c = clinic(Some(classifier.clone()));
        assert!(c
            .scheduler
            .schedule_by_symptom(PatientId::new(), "chest pain", at(9, 0))
            .is_err());
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn double_booking_same_instant_is_unavailable() {
        let c = clinic(None);
        let first = c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();
        let other = add_patient(&c, "Anita Rao");

        let err = c.scheduler.schedule(c.priya, other, at(9, 0)).unwrap_err();
        match err {
            SchedulingError::DoctorUnavailable { doctor, at: when, conflicting } => {
                assert_eq!(doctor, "Priya Sharma");
                assert_eq!(when, at(9, 0));
                assert_eq!(conflicting, first.id());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(c.log.len().unwrap(), 1);

        // A different minute is fine.
        c.scheduler.schedule(c.priya, other, at(9, 1)).unwrap();
    }

    #[test]
    fn cancelled_appointment_frees_the_slot() {
        let c = clinic(None);
        let first = c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();
        c.scheduler.cancel(first.id()).unwrap();

        let again = c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();
        assert_ne!(again.id(), first.id());
        assert_eq!(c.scheduler.appointments().unwrap().len(), 2);
    }

    #[test]
    fn completed_appointment_frees_the_slot() {
        let c = clinic(None);
        let first = c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();
        c.scheduler.complete(first.id()).unwrap();
        assert!(c.scheduler.is_doctor_available(c.priya, at(9, 0)).unwrap());
    }

    #[test]
    fn symptom_booking_uses_rules_without_classifier() {
        let c = clinic(None);
        let derm = add_doctor(&c, "Meera Iyer", "Dermatologist");

        let appt = c
            .scheduler
            .schedule_by_symptom(c.ravi, "itchy skin on both arms", at(10, 0))
            .unwrap();
        assert_eq!(appt.doctor_id(), derm);
        assert_eq!(appt.specialty(), Some("Dermatologist"));
        assert_eq!(appt.symptoms(), Some("itchy skin on both arms"));
    }

    #[test]
    fn classifier_first_candidate_is_used() {
        let c = clinic(Some(Arc::new(StaticClassifier::answer("Cardiologist, Internist"))));
        let resolution = c.scheduler.resolve_specialty("something vague");
        assert_eq!(resolution.specialty, "Cardiologist");
        assert_eq!(resolution.source, ClassificationSource::Classifier);

        let appt = c
            .scheduler
            .schedule_by_symptom(c.ravi, "something vague", at(11, 0))
            .unwrap();
        assert_eq!(appt.doctor_id(), c.priya);
        assert_eq!(appt.specialty(), Some("Cardiologist"));
    }

    #[test]
    fn classifier_output_matches_case_insensitively() {
        let c = clinic(Some(Arc::new(StaticClassifier::answer("  cardiologist  "))));
        let appt = c.scheduler.schedule_by_symptom(c.ravi, "tired", at(11, 0)).unwrap();
        assert_eq!(appt.doctor_id(), c.priya);
    }

    #[test]
    fn failing_classifier_falls_back_to_rules() {
        let c = clinic(Some(Arc::new(StaticClassifier::failing())));
        let appt = c
            .scheduler
            .schedule_by_symptom(c.ravi, "chest pain", at(12, 0))
            .unwrap();
        assert_eq!(appt.doctor_id(), c.priya);
    }

    #[test]
    fn blank_classifier_answer_falls_back_to_rules() {
        let c = clinic(Some(Arc::new(StaticClassifier::answer(" , "))));
        let resolution = c.scheduler.resolve_specialty("heart racing");
        assert_eq!(resolution.specialty, "Cardiologist");
        assert_eq!(resolution.source, ClassificationSource::RuleBased);
    }

    #[test]
    fn injected_classifier_gets_default_deadline() {
        let c = clinic(Some(Arc::new(StaticClassifier::answer("Cardiologist"))));
        assert_eq!(c.scheduler.classifier_timeout(), Some(DEFAULT_CLASSIFIER_TIMEOUT));
        assert_eq!(clinic(None).scheduler.classifier_timeout(), None);
    }

    #[test]
    fn slow_injected_classifier_falls_back_quickly() {
        let c = clinic(Some(Arc::new(SlowClassifier::new(
            Duration::from_secs(3),
            "Dermatologist",
        ))));
        let scheduler = c.scheduler.with_classifier_timeout(Duration::from_millis(50));

        let start = Instant::now();
        let appt = scheduler.schedule_by_symptom(c.ravi, "chest pain", at(12, 0)).unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(appt.doctor_id(), c.priya);
        assert_eq!(appt.specialty(), Some("Cardiologist"));
    }

    #[test]
    fn panicking_injected_classifier_falls_back_to_rules() {
        let c = clinic(Some(Arc::new(PanickingClassifier)));
        let resolution = c.scheduler.resolve_specialty("chest pain");
        assert_eq!(resolution.specialty, "Cardiologist");
        assert_eq!(resolution.source, ClassificationSource::RuleBased);

        let appt = c
            .scheduler
            .schedule_by_symptom(c.ravi, "chest pain", at(12, 30))
            .unwrap();
        assert_eq!(appt.doctor_id(), c.priya);
        assert_eq!(c.log.len().unwrap(), 1);
    }

    #[test]
    fn synonym_does_not_match() {
        let c = clinic(Some(Arc::new(StaticClassifier::answer("Cardiology"))));
        let err = c
            .scheduler
            .schedule_by_symptom(c.ravi, "chest pain", at(13, 0))
            .unwrap_err();
        assert_eq!(err, SchedulingError::NoDoctorForSpecialty("Cardiology".into()));
        assert!(c.log.is_empty().unwrap());
    }

    #[test]
    fn no_doctor_for_fallback_specialty() {
        let c = clinic(None);
        let err = c.scheduler.schedule_by_symptom(c.ravi, "tired", at(13, 0)).unwrap_err();
        assert_eq!(err, SchedulingError::NoDoctorForSpecialty("General Physician".into()));
        assert_eq!(err.to_string(), "No doctor found for specialty: General Physician");
    }

    #[test]
    fn first_registered_doctor_of_specialty_wins() {
        let c = clinic(None);
        add_doctor(&c, "Arjun Mehta", "Cardiologist");

        let first = c.scheduler.schedule_by_symptom(c.ravi, "chest pain", at(9, 0)).unwrap();
        assert_eq!(first.doctor_id(), c.priya);

        // No load balancing: the second request still targets Priya and conflicts.
        let other = add_patient(&c, "Anita Rao");
        let err = c.scheduler.schedule_by_symptom(other, "bp high", at(9, 0)).unwrap_err();
        assert!(matches!(err, SchedulingError::DoctorUnavailable { .. }));
    }

    #[test]
    fn state_changes_go_through_the_log() {
        let c = clinic(None);
        let appt = c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();

        c.scheduler.complete(appt.id()).unwrap();
        c.scheduler.complete(appt.id()).unwrap();
        let err = c.scheduler.cancel(appt.id()).unwrap_err();
        assert_eq!(
            err,
            SchedulingError::InvalidTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Cancelled,
            }
        );
        let stored = c.scheduler.appointment(appt.id()).unwrap().unwrap();
        assert_eq!(stored.status(), AppointmentStatus::Completed);
    }

    #[test]
    fn describe_resolves_names() {
        let c = clinic(None);
        let appt = c.scheduler.schedule(c.priya, c.ravi, at(14, 30)).unwrap();
        assert_eq!(
            c.scheduler.describe(&appt).unwrap(),
            "Appointment: Ravi Kumar with Dr. Priya Sharma on 11-Nov-2025 14:30 [Scheduled]"
        );
    }

    #[test]
    fn appointments_for_doctor_filters() {
        let c = clinic(None);
        let derm = add_doctor(&c, "Meera Iyer", "Dermatologist");
        c.scheduler.schedule(c.priya, c.ravi, at(9, 0)).unwrap();
        c.scheduler.schedule(derm, c.ravi, at(9, 0)).unwrap();
        c.scheduler.schedule(derm, c.ravi, at(10, 0)).unwrap();

        assert_eq!(c.scheduler.appointments_for_doctor(c.priya).unwrap().len(), 1);
        assert_eq!(c.scheduler.appointments_for_doctor(derm).unwrap().len(), 2);
    }

    #[test]
    fn concurrent_requests_for_same_slot_book_once() {
        let c = clinic(None);
        let p2 = add_patient(&c, "Anita Rao");
        let scheduler = Arc::new(c.scheduler);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [c.ravi, p2]
            .into_iter()
            .map(|patient| {
                let scheduler = Arc::clone(&scheduler);
                let barrier = Arc::clone(&barrier);
                let doctor = c.priya;
                thread::spawn(move || {
                    barrier.wait();
                    scheduler.schedule(doctor, patient, at(15, 0))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let booked = results.iter().filter(|r| r.is_ok()).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(SchedulingError::DoctorUnavailable { .. })))
            .count();

        assert_eq!(booked, 1);
        assert_eq!(refused, 1);
        assert_eq!(c.log.len().unwrap(), 1);
    }

    #[test]
    fn many_concurrent_symptom_requests_book_once_per_slot() {
        let c = clinic(None);
        let patients: Vec<_> = (0..8).map(|i| add_patient(&c, &format!("Patient {i}"))).collect();
        let scheduler = Arc::new(c.scheduler);

        let handles: Vec<_> = patients
            .into_iter()
            .map(|patient| {
                let scheduler = Arc::clone(&scheduler);
                thread::spawn(move || scheduler.schedule_by_symptom(patient, "chest pain", at(16, 0)))
            })
            .collect();

        let booked = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(booked, 1);
        assert_eq!(c.log.len().unwrap(), 1);
    }

    #[test]
    fn from_config_without_ai_has_no_classifier() {
        let config = SchedulerConfig {
            use_ai: false,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::from_config(
            &config,
            Arc::new(RwLock::new(Directory::new())),
            Arc::new(AppointmentLog::new()),
        );
        assert!(!scheduler.has_classifier());
    }

    #[test]
    fn from_config_with_ai_wraps_ollama() {
        let scheduler = Scheduler::from_config(
            &SchedulerConfig::default(),
            Arc::new(RwLock::new(Directory::new())),
            Arc::new(AppointmentLog::new()),
        );
        assert!(scheduler.has_classifier());
        assert_eq!(scheduler.classifier_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn from_config_applies_configured_deadline() {
        let config = SchedulerConfig {
            classifier_timeout_secs: 5,
            ..SchedulerConfig::default()
        };
        let scheduler = Scheduler::from_config(
            &config,
            Arc::new(RwLock::new(Directory::new())),
            Arc::new(AppointmentLog::new()),
        );
        assert_eq!(scheduler.classifier_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn end_to_end_priya_and_ravi() {
        let c = clinic(None);
        let when = at(14, 30);

        let appt = c
            .scheduler
            .schedule_by_symptom(c.ravi, "chest pain and shortness of breath", when)
            .unwrap();
        assert_eq!(appt.status(), AppointmentStatus::Scheduled);
        let doctor_name = c
            .scheduler
            .directory()
            .read()
            .unwrap()
            .doctor(appt.doctor_id())
            .unwrap()
            .name()
            .to_string();
        assert_eq!(doctor_name, "Priya Sharma");

        let err = c
            .scheduler
            .schedule_by_symptom(c.ravi, "heart palpitations", when)
            .unwrap_err();
        assert!(matches!(err, SchedulingError::DoctorUnavailable { .. }));
        assert_eq!(c.log.len().unwrap(), 1);
    }
}
