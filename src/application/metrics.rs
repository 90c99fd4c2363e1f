//! Observability metrics for debouncers and throttlers.
//!
//! Provides counters describing how many calls were coalesced away for
//! monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking call and invocation statistics.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// For a debouncer, every delivered value is a call and every settlement is a
/// deferred invocation.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Calls (or delivered values) accepted
    calls_received: AtomicU64,
    /// Invocations made synchronously inside `call`
    invocations_immediate: AtomicU64,
    /// Invocations made when a timer fired
    invocations_deferred: AtomicU64,
    /// Pending timers replaced by a newer call
    timers_superseded: AtomicU64,
    /// Pending timers cancelled by dispose or replace
    timers_cancelled: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                calls_received: AtomicU64::new(0),
                invocations_immediate: AtomicU64::new(0),
                invocations_deferred: AtomicU64::new(0),
                timers_superseded: AtomicU64::new(0),
                timers_cancelled: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_call(&self) {
        self.inner.calls_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_immediate(&self) {
        self.inner
            .invocations_immediate
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred(&self) {
        self.inner
            .invocations_deferred
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_superseded(&self) {
        self.inner.timers_superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cancelled(&self) {
        self.inner.timers_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the total number of calls received.
    pub fn calls_received(&self) -> u64 {
        self.inner.calls_received.load(Ordering::Relaxed)
    }

    /// Get the number of immediate invocations.
    pub fn invocations_immediate(&self) -> u64 {
        self.inner.invocations_immediate.load(Ordering::Relaxed)
    }

    /// Get the number of timer-driven invocations.
    pub fn invocations_deferred(&self) -> u64 {
        self.inner.invocations_deferred.load(Ordering::Relaxed)
    }

    /// Get the number of pending timers replaced by newer calls.
    pub fn timers_superseded(&self) -> u64 {
        self.inner.timers_superseded.load(Ordering::Relaxed)
    }

    /// Get the number of pending timers cancelled by teardown or replacement.
    pub fn timers_cancelled(&self) -> u64 {
        self.inner.timers_cancelled.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls_received: self.calls_received(),
            invocations_immediate: self.invocations_immediate(),
            invocations_deferred: self.invocations_deferred(),
            timers_superseded: self.timers_superseded(),
            timers_cancelled: self.timers_cancelled(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.calls_received.store(0, Ordering::Relaxed);
        self.inner.invocations_immediate.store(0, Ordering::Relaxed);
        self.inner.invocations_deferred.store(0, Ordering::Relaxed);
        self.inner.timers_superseded.store(0, Ordering::Relaxed);
        self.inner.timers_cancelled.store(0, Ordering::Relaxed);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Calls (or delivered values) accepted
    pub calls_received: u64,
    /// Invocations made synchronously inside `call`
    pub invocations_immediate: u64,
    /// Invocations made when a timer fired
    pub invocations_deferred: u64,
    /// Pending timers replaced by a newer call
    pub timers_superseded: u64,
    /// Pending timers cancelled by dispose or replace
    pub timers_cancelled: u64,
}

impl MetricsSnapshot {
    /// Total number of times the underlying callback ran.
    pub fn total_invocations(&self) -> u64 {
        self.invocations_immediate
            .saturating_add(self.invocations_deferred)
    }

    /// Fraction of calls (0.0 to 1.0) that have not resulted in an invocation.
    ///
    /// Returns 0.0 if no calls have been received.
    pub fn coalescing_rate(&self) -> f64 {
        if self.calls_received == 0 {
            return 0.0;
        }
        let coalesced = self
            .calls_received
            .saturating_sub(self.total_invocations());
        coalesced as f64 / self.calls_received as f64
    }
}
