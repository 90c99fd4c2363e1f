//! Shared slot for a user-facing error message.
//!
//! The error display reads the message and offers a dismiss action; both
//! sides hold clones of the same slot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A single optional error message shared between producers and a display.
///
/// # Example
/// ```
/// use pacekeeper::ErrorSlot;
///
/// let slot = ErrorSlot::new();
/// let display = slot.clone();
///
/// slot.report("Request timed out");
/// assert_eq!(display.error().as_deref(), Some("Request timed out"));
///
/// display.clear_error();
/// assert!(!slot.has_error());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    message: Arc<Mutex<Option<String>>>,
}

impl ErrorSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `message`, replacing any previous one.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(error = %message, "error reported");
        *self.lock() = Some(message);
    }

    /// The current message, if any.
    pub fn error(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Check if a message is present.
    pub fn has_error(&self) -> bool {
        self.lock().is_some()
    }

    /// Dismiss the current message.
    pub fn clear_error(&self) {
        if self.lock().take().is_some() {
            debug!("error cleared");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.message.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
