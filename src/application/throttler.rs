//! Throttled invoker.
//!
//! Binds a [`ThrottleState`] to a [`Scheduler`] and a [`Clock`], turning the
//! pure throttle decisions into real invocations and timers.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Scheduler, TimerHandle};
use crate::domain::throttle::{ThrottleDecision, ThrottlePhase, ThrottleState};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, trace};

/// Callback invoked by a [`Throttler`].
pub type Callback<A> = Arc<dyn Fn(A) + Send + Sync + 'static>;

/// Wraps a callback so that it runs at most once per `delay`.
///
/// The first call runs the callback immediately. Calls that arrive inside the
/// window are coalesced: only the most recent one survives, and it runs once
/// the window has elapsed. There is no queue.
///
/// The callback never runs while the throttler's internal lock is held, so it
/// may call back into the same throttler.
///
/// Dropping the throttler disposes it, cancelling any pending trailing call.
///
/// # Example
///
/// ```
/// use pacekeeper::infrastructure::mocks::ManualScheduler;
/// use pacekeeper::Throttler;
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let throttler = Throttler::new(
///     move |offset: u32| sink.lock().unwrap().push(offset),
///     Duration::from_millis(100),
///     Arc::new(scheduler.clone()),
///     Arc::new(scheduler.clock()),
/// );
///
/// throttler.call(0);
/// scheduler.advance(Duration::from_millis(10));
/// throttler.call(10);
/// scheduler.advance(Duration::from_millis(20));
/// throttler.call(30);
///
/// scheduler.advance(Duration::from_millis(70));
/// assert_eq!(*seen.lock().unwrap(), vec![0, 30]);
/// ```
pub struct Throttler<A: Send + 'static> {
    shared: Arc<Shared<A>>,
}

struct Shared<A> {
    core: Mutex<Core<A>>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

struct Core<A> {
    state: ThrottleState<A>,
    callback: Callback<A>,
    timer: Option<TimerHandle>,
    disposed: bool,
}

impl<A: Send + 'static> Throttler<A> {
    /// Create a throttler from explicit ports.
    ///
    /// Most callers use [`Throttler::builder`], which picks the tokio
    /// scheduler and clock when available.
    pub fn new<F>(
        callback: F,
        delay: Duration,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::from_parts(Arc::new(callback), delay, scheduler, clock, Metrics::new())
    }

    pub(crate) fn from_parts(
        callback: Callback<A>,
        delay: Duration,
        scheduler: Arc<dyn Scheduler>,
        clock: Arc<dyn Clock>,
        metrics: Metrics,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state: ThrottleState::new(delay),
                    callback,
                    timer: None,
                    disposed: false,
                }),
                scheduler,
                clock,
                metrics,
            }),
        }
    }

    /// Request an invocation with `args`.
    ///
    /// Runs the callback before returning if the window has elapsed;
    /// otherwise replaces any pending trailing call with this one.
    /// Ignored after [`dispose`](Self::dispose).
    pub fn call(&self, args: A) {
        let invocation = {
            let mut core = self.shared.lock();
            if core.disposed {
                trace!("call on disposed throttler ignored");
                return;
            }
            self.shared.metrics.record_call();

            if let Some(timer) = core.timer.take() {
                timer.cancel();
            }

            let now = self.shared.clock.now();
            let outcome = core.state.request(args, now);
            if outcome.superseded {
                self.shared.metrics.record_superseded();
                trace!("pending trailing call superseded");
            }

            match outcome.decision {
                ThrottleDecision::InvokeNow(args) => {
                    self.shared.metrics.record_immediate();
                    Some((Arc::clone(&core.callback), args))
                }
                ThrottleDecision::Deferred { generation, after } => {
                    trace!(generation, delay_ms = after.as_millis() as u64, "trailing call scheduled");
                    let shared = Arc::downgrade(&self.shared);
                    core.timer = Some(
                        self.shared
                            .scheduler
                            .schedule(after, Box::new(move || fire(&shared, generation))),
                    );
                    None
                }
            }
        };

        if let Some((callback, args)) = invocation {
            callback(args);
        }
    }

    /// Swap the callback and delay.
    ///
    /// Any pending trailing call is cancelled first so the old callback can
    /// never run after this returns. The time of the last invocation is kept.
    pub fn replace<F>(&self, callback: F, delay: Duration)
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let mut core = self.shared.lock();
        self.shared.cancel_pending(&mut core);
        core.callback = Arc::new(callback);
        core.state.set_delay(delay);
        debug!(delay_ms = delay.as_millis() as u64, "throttler callback replaced");
    }

    /// Cancel any pending trailing call and stop accepting calls.
    ///
    /// Idempotent.
    pub fn dispose(&self) {
        let mut core = self.shared.lock();
        if core.disposed {
            return;
        }
        core.disposed = true;
        self.shared.cancel_pending(&mut core);
        debug!("throttler disposed");
    }

    /// Check if the throttler has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Current state-machine phase.
    pub fn phase(&self) -> ThrottlePhase {
        let core = self.shared.lock();
        core.state.phase(self.shared.clock.now())
    }

    /// The configured minimum spacing.
    pub fn delay(&self) -> Duration {
        self.shared.lock().state.window().delay()
    }

    /// Call and invocation counters.
    pub fn metrics(&self) -> &Metrics {
        &self.shared.metrics
    }
}

impl<A> Shared<A> {
    fn lock(&self) -> MutexGuard<'_, Core<A>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_pending(&self, core: &mut Core<A>) {
        if let Some(timer) = core.timer.take() {
            timer.cancel();
        }
        if core.state.cancel() {
            self.metrics.record_cancelled();
            trace!("pending trailing call cancelled");
        }
    }
}

fn fire<A>(shared: &Weak<Shared<A>>, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let invocation = {
        let mut core = shared.lock();
        if core.disposed {
            return;
        }
        let now = shared.clock.now();
        match core.state.fire(generation, now) {
            Some(args) => {
                core.timer = None;
                shared.metrics.record_deferred();
                Some((Arc::clone(&core.callback), args))
            }
            None => {
                trace!(generation, "stale trailing timer ignored");
                None
            }
        }
    };

    if let Some((callback, args)) = invocation {
        trace!(generation, "trailing call invoked");
        callback(args);
    }
}

impl<A: Send + 'static> Drop for Throttler<A> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<A: Send + 'static> std::fmt::Debug for Throttler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.lock();
        f.debug_struct("Throttler")
            .field("delay", &core.state.window().delay())
            .field("pending", &core.state.has_pending())
            .field("disposed", &core.disposed)
            .finish()
    }
}
