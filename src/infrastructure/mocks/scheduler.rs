//! Virtual-time scheduler for testing.

use super::clock::MockClock;
use crate::application::ports::{Clock, Scheduler, TimerHandle, TimerTask};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Deadline offset used when `now + delay` overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Scheduler driven by explicit calls to [`advance`](Self::advance).
///
/// Timers fire in deadline order (ties in scheduling order). Before a timer
/// runs, the shared [`MockClock`] is moved to its deadline, so code reading the
/// clock inside the timer sees the exact firing time. Timers scheduled while
/// advancing fire in the same call if they fall due before the target.
///
/// # Examples
///
/// ```
/// use pacekeeper::infrastructure::mocks::ManualScheduler;
/// use pacekeeper::Scheduler;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&fired);
///
/// let _timer = scheduler.schedule(
///     Duration::from_millis(100),
///     Box::new(move || flag.store(true, Ordering::SeqCst)),
/// );
///
/// assert_eq!(scheduler.advance(Duration::from_millis(99)), 0);
/// assert_eq!(scheduler.advance(Duration::from_millis(1)), 1);
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: MockClock,
    queue: Arc<Mutex<TimerQueue>>,
}

#[derive(Default)]
struct TimerQueue {
    timers: BTreeMap<(Instant, u64), TimerTask>,
    next_id: u64,
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.timers.len())
            .finish()
    }
}

impl ManualScheduler {
    /// Create a scheduler with a fresh mock clock.
    pub fn new() -> Self {
        Self::with_clock(MockClock::default())
    }

    /// Create a scheduler driving an existing mock clock.
    pub fn with_clock(clock: MockClock) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(TimerQueue::default())),
        }
    }

    /// A handle to the clock this scheduler moves.
    pub fn clock(&self) -> MockClock {
        self.clock.clone()
    }

    /// The instant virtual time started at.
    pub fn start(&self) -> Instant {
        self.clock.start()
    }

    /// Virtual time elapsed since the start.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Number of timers waiting to fire.
    pub fn pending(&self) -> usize {
        self.queue().timers.len()
    }

    /// Deadline of the next timer, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue().timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move time forward by `duration`, firing every timer that falls due.
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, duration: Duration) -> usize {
        self.run_until(self.clock.now() + duration)
    }

    /// Move time forward to `start + offset`, firing every timer that falls due.
    ///
    /// Does nothing if that point is already in the past.
    pub fn advance_to(&self, offset: Duration) -> usize {
        self.run_until(self.clock.start() + offset)
    }

    fn run_until(&self, target: Instant) -> usize {
        let mut fired = 0;

        loop {
            let due = {
                let mut queue = self.queue();
                match queue.timers.keys().next() {
                    Some(&(deadline, _)) if deadline <= target => queue.timers.pop_first(),
                    _ => None,
                }
            };

            let Some(((deadline, _), task)) = due else {
                break;
            };
            if deadline > self.clock.now() {
                self.clock.set(deadline);
            }
            task();
            fired += 1;
        }

        if target > self.clock.now() {
            self.clock.set(target);
        }
        fired
    }

    fn queue(&self) -> MutexGuard<'_, TimerQueue> {
        self.queue
            .lock()
            .expect("ManualScheduler mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let now = self.clock.now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        let key = {
            let mut queue = self.queue();
            let key = (deadline, queue.next_id);
            queue.next_id += 1;
            queue.timers.insert(key, task);
            key
        };

        let queue = Arc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue
                    .lock()
                    .expect("ManualScheduler mutex poisoned - a test thread panicked while holding the lock")
                    .timers
                    .remove(&key);
            }
        })
    }
}
