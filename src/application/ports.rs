//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, TokioClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Work to run when a timer fires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Port for one-shot timers.
///
/// Infrastructure provides concrete implementations (TokioScheduler,
/// ManualScheduler). A scheduler only has to run `task` once after `delay`;
/// it does not need to guarantee that cancellation wins a race against a
/// timer that is already firing. The services check timer generations
/// themselves.
///
/// `task` must not run before `schedule` returns: the services call
/// `schedule` while holding their own lock and the task takes that lock.
pub trait Scheduler: Send + Sync + Debug {
    /// Run `task` once after `delay`.
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Handle to a scheduled timer.
///
/// Dropping a handle does NOT cancel the timer. Call [`TimerHandle::cancel`].
#[must_use = "dropping a TimerHandle leaves the timer running"]
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    /// Create a handle from the action that cancels the timer.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Create a handle for a timer that cannot be cancelled.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Cancel the timer. Has no effect if it already fired.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cancel_runs_action_once() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = TimerHandle::new(move || flag.store(true, Ordering::SeqCst));
        assert_eq!(format!("{:?}", handle), "TimerHandle { cancellable: true }");

        handle.cancel();
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_does_not_cancel() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        drop(TimerHandle::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(!cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_detached_cancel_is_noop() {
        TimerHandle::detached().cancel();
    }
}
