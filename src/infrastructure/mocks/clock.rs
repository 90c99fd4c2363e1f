//! Mock clock for testing.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Mock clock for testing.
///
/// Time only moves when a test moves it. The clock remembers the instant it
/// started at, so tests can talk about "t = 30ms" instead of raw instants.
///
/// # Examples
///
/// ```
/// use pacekeeper::infrastructure::mocks::MockClock;
/// use pacekeeper::Clock;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.now(), start);
///
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.elapsed(), Duration::from_millis(250));
///
/// clock.set_elapsed(Duration::from_millis(40));
/// assert_eq!(clock.now(), start + Duration::from_millis(40));
/// ```
///
/// All clones share the same time, so advancing one clone advances all of
/// them.
#[derive(Debug, Clone)]
pub struct MockClock {
    inner: Arc<Mutex<Timeline>>,
}

#[derive(Debug)]
struct Timeline {
    start: Instant,
    now: Instant,
}

impl MockClock {
    /// Create a mock clock starting at a specific instant.
    pub fn new(start: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Timeline { start, now: start })),
        }
    }

    /// The instant the clock started at.
    pub fn start(&self) -> Instant {
        self.timeline().start
    }

    /// Time elapsed since the start.
    pub fn elapsed(&self) -> Duration {
        let timeline = self.timeline();
        timeline.now.saturating_duration_since(timeline.start)
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        self.timeline().now += duration;
    }

    /// Set the clock to a specific instant. Moving backwards is allowed.
    pub fn set(&self, instant: Instant) {
        self.timeline().now = instant;
    }

    /// Set the clock to `start + offset`.
    pub fn set_elapsed(&self, offset: Duration) {
        let mut timeline = self.timeline();
        timeline.now = timeline.start + offset;
    }

    fn timeline(&self) -> MutexGuard<'_, Timeline> {
        self.inner
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.timeline().now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::default();
        let clone = clock.clone();

        let handle = std::thread::spawn(move || clone.advance(Duration::from_secs(5)));
        handle.join().unwrap();

        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        assert_eq!(clock.now(), clock.start() + Duration::from_secs(5));
    }

    #[test]
    fn test_backwards_set_reports_zero_elapsed() {
        let start = Instant::now() + Duration::from_secs(10);
        let clock = MockClock::new(start);

        clock.set(start - Duration::from_secs(1));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }
}
