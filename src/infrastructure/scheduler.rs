//! Tokio-backed timer scheduler.

use crate::application::ports::{Scheduler, TimerHandle, TimerTask};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};

/// Deadline used when `now + delay` is not representable (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Scheduler that runs each timer as a task on a tokio runtime.
///
/// The deadline is fixed when [`schedule`](Scheduler::schedule) is called,
/// not when the spawned task is first polled. Cancelling aborts the task.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Create a scheduler on an explicit runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a scheduler on the runtime of the current context.
    ///
    /// Returns `None` when called outside a tokio runtime.
    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        let join = self.handle.spawn(async move {
            sleep_until(deadline).await;
            task();
        });
        TimerHandle::new(move || join.abort())
    }
}
