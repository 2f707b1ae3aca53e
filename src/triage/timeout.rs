use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{predict_guarded, ClassifierError, SpecialtyClassifier};

/// Deadline used when the caller does not pick one.
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(60);

/// Workers allowed to run at once, including ones abandoned after a timeout.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Bounds any classifier with a wall-clock deadline.
///
/// The prediction runs on a worker thread. If it has not answered when the
/// deadline passes the caller gets `ClassifierError::Timeout` and moves on.
///
/// A thread cannot be killed, so a timed-out worker keeps running until the
/// inner classifier returns; its answer is then dropped. Such workers still
/// count against `max_in_flight`. Once that many are running, `predict` fails
/// with `ClassifierError::Busy` without spawning, so an inner classifier that
/// never returns costs at most `max_in_flight` threads. Inner classifiers
/// should still bound their own I/O (`OllamaTriageClient` sets an HTTP
/// timeout) so those slots come back.
pub struct TimeoutClassifier {
    inner: Arc<dyn SpecialtyClassifier>,
    timeout: Duration,
    max_in_flight: usize,
    in_flight: Arc<AtomicUsize>,
}

/// Releases an in-flight slot when the worker ends, however it ends.
struct InFlightSlot(Arc<AtomicUsize>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TimeoutClassifier {
    pub fn new(inner: Arc<dyn SpecialtyClassifier>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// At least one worker is always allowed.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Workers currently running, answered or not.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn acquire_slot(&self) -> Result<InFlightSlot, ClassifierError> {
        self.in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_in_flight).then_some(n + 1)
            })
            .map_err(|running| {
                tracing::warn!(running, "classifier workers saturated");
                ClassifierError::Busy(running)
            })?;
        Ok(InFlightSlot(Arc::clone(&self.in_flight)))
    }
}

impl SpecialtyClassifier for TimeoutClassifier {
    fn predict(&self, symptom_text: &str) -> Result<String, ClassifierError> {
        let slot = self.acquire_slot()?;
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let text = symptom_text.to_string();

        thread::Builder::new()
            .name("meditel-triage".into())
            .spawn(move || {
                let result = predict_guarded(inner.as_ref(), &text);
                drop(slot);
                // Receiver may be gone after a timeout.
                let _ = tx.send(result);
            })
            .map_err(|e| ClassifierError::Worker(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "classifier timed out");
                Err(ClassifierError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ClassifierError::Worker("worker exited without answering".into()))
            }
        }
    }
}
