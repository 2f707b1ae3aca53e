//! Meditel clinic scheduling core.
//!
//! Books conflict-free appointments either for an explicit doctor or from a
//! patient's free-text symptoms, optionally asking an external classifier
//! (Ollama) for the specialty and falling back to a keyword table.

pub mod config;
pub mod directory;
pub mod models;
pub mod scheduling;
pub mod triage;

pub use config::SchedulerConfig;
pub use directory::{Directory, DirectoryError};
pub use models::{Appointment, AppointmentStatus, Describable, Doctor, ModelError, Patient};
pub use scheduling::{AppointmentLog, Scheduler, SchedulingError};
pub use triage::{ClassifierError, SpecialtyClassifier};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` (or the crate default).
///
/// Returns `false` when the host application already installed one.
pub fn init_tracing() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} scheduling core v{}", config::APP_NAME, config::APP_VERSION);
    }
    installed
}
