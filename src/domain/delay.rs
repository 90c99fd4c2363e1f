//! Delay validation.
//!
//! `Duration` cannot be negative, but delays frequently arrive as signed
//! millisecond counts (configuration files, environment variables, FFI).
//! Those are checked here before any timer is involved.

use std::time::Duration;

/// Error returned when a delay cannot be represented as a `Duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayError {
    /// The delay was below zero milliseconds
    Negative(i64),
}

impl std::fmt::Display for DelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelayError::Negative(ms) => {
                write!(f, "delay must not be negative (got {}ms)", ms)
            }
        }
    }
}

impl std::error::Error for DelayError {}

/// Convert a signed millisecond count into a `Duration`.
///
/// # Errors
/// Returns `DelayError::Negative` if `ms` is below zero.
///
/// # Example
/// ```
/// use pacekeeper::delay_from_millis;
/// use std::time::Duration;
///
/// assert_eq!(delay_from_millis(300).unwrap(), Duration::from_millis(300));
/// assert!(delay_from_millis(-1).is_err());
/// ```
pub fn delay_from_millis(ms: i64) -> Result<Duration, DelayError> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| DelayError::Negative(ms))
}
