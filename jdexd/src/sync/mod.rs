pub mod backoff;
pub mod engine;
pub mod executor;
pub mod gate;
pub mod local_watcher;
pub mod notifier;
pub mod queue;

pub use engine::{Engine, EngineError, MutationReport, RenameOutcome};
pub use executor::{RenameStatus, RetryPolicy};
pub use gate::{Admission, Suppressed};
pub use notifier::{DesktopNotifier, LogNotifier, Notifier, RecordingNotifier};
