//! Admission control for structural-change notifications.
//!
//! A notification is only planned when the engine is completely quiet: no
//! chain is pending, no other mutation is being planned, and the node it
//! names is not waiting on a rename of our own. Anything else is presumed to
//! be an echo of a rename the engine issued.

use std::sync::{Arc, Mutex};

use super::queue::{QueueState, RenameQueue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppressed {
    /// Another mutation is being planned or its renames are still queued.
    Busy,
    /// The notification names a node whose rename is queued.
    InFlight(String),
}

/// Held while one admitted mutation is planned and queued. Counts as a
/// pending chain for the gate until dropped.
#[derive(Debug)]
pub struct Admission {
    state: Arc<Mutex<QueueState>>,
}

impl Drop for Admission {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect("rename queue lock poisoned");
        state.admissions = state.admissions.saturating_sub(1);
    }
}

impl RenameQueue {
    /// Evaluates the gate for a notification touching `identities`.
    pub fn try_admit(&self, identities: &[&str]) -> Result<Admission, Suppressed> {
        let mut state = self.lock();
        if let Some(identity) = identities
            .iter()
            .find(|identity| state.in_flight.contains_key(**identity))
        {
            return Err(Suppressed::InFlight((*identity).to_string()));
        }
        if state.admissions > 0 || !state.tails.is_empty() {
            return Err(Suppressed::Busy);
        }
        state.admissions += 1;
        Ok(Admission {
            state: Arc::clone(&self.state),
        })
    }
}
