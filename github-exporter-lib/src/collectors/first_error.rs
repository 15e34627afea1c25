use ohno::AppError;
use std::sync::{Mutex, PoisonError};

const LOG_TARGET: &str = "collectors";

/// Keeps the first error reported by a group of concurrent tasks.
///
/// Recording never blocks; errors arriving after the first one are logged and dropped.
#[derive(Debug, Default)]
pub struct FirstError {
    slot: Mutex<Option<AppError>>,
}

impl FirstError {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` if no error has been recorded yet. Returns whether it was kept.
    pub fn record(&self, error: AppError) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            log::debug!(target: LOG_TARGET, "Dropping additional error: {error}");
            return false;
        }

        *slot = Some(error);
        true
    }

    /// Removes and returns the recorded error, if any.
    pub fn take(&self) -> Option<AppError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
