//! Clock adapters for time operations.
//!
//! Provides `SystemClock` for plain wall-clock use and `TokioClock` (with the
//! `async` feature) which follows tokio's time source, including paused time
//! in tests.
//!
//! # Testing
//!
//! See `MockClock` (in `crate::infrastructure::mocks`) for a controllable test clock.
//! Available with the `test-helpers` feature or in test builds:
//!
//! ```toml
//! [dev-dependencies]
//! pacekeeper = { version = "*", features = ["test-helpers"] }
//! ```

use crate::application::ports::Clock;
use std::time::Instant;

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock reading `tokio::time::Instant::now()`.
///
/// Pair it with `TokioScheduler` so that the throttle window and the timers
/// agree on the current time, including under `tokio::time::pause`.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[cfg(feature = "async")]
impl TokioClock {
    /// Create a new tokio clock.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "async")]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
