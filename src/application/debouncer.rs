//! Debounced value holder.
//!
//! Binds a [`DebounceState`] to a [`Scheduler`]. Settled values are published
//! to listeners and, with the `async` feature, to a `tokio::sync::watch`
//! channel.

use crate::application::metrics::Metrics;
use crate::application::ports::{Scheduler, TimerHandle};
use crate::domain::debounce::{DebounceState, SettleTicket};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, trace};

#[cfg(feature = "async")]
use tokio::sync::watch;

/// Listener notified with every settled value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Holds a value that only settles after its input has been quiet for `delay`.
///
/// Every [`set`](Self::set) restarts the quiet period. When the period elapses
/// without another `set`, the last input becomes the settled value returned by
/// [`get`](Self::get) and is passed to listeners.
///
/// Dropping the debouncer disposes it; a pending input is discarded.
///
/// # Example
///
/// ```
/// use pacekeeper::infrastructure::mocks::ManualScheduler;
/// use pacekeeper::Debouncer;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let scheduler = ManualScheduler::new();
/// let query = Debouncer::new(String::new(), Duration::from_millis(300), Arc::new(scheduler.clone()));
///
/// query.set("r".to_string());
/// scheduler.advance(Duration::from_millis(100));
/// query.set("ru".to_string());
/// scheduler.advance(Duration::from_millis(100));
/// query.set("rust".to_string());
///
/// scheduler.advance(Duration::from_millis(299));
/// assert_eq!(query.get(), "");
///
/// scheduler.advance(Duration::from_millis(1));
/// assert_eq!(query.get(), "rust");
/// ```
pub struct Debouncer<T: Clone + Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    core: Mutex<Core<T>>,
    scheduler: Arc<dyn Scheduler>,
    metrics: Metrics,
    listeners: Vec<Listener<T>>,
    #[cfg(feature = "async")]
    settled_tx: watch::Sender<T>,
}

struct Core<T> {
    state: DebounceState<T>,
    timer: Option<TimerHandle>,
    disposed: bool,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Create a debouncer from an explicit scheduler.
    ///
    /// Most callers use [`Debouncer::builder`], which picks the tokio
    /// scheduler when available.
    pub fn new(initial: T, delay: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::from_parts(initial, delay, scheduler, Vec::new(), Metrics::new())
    }

    pub(crate) fn from_parts(
        initial: T,
        delay: Duration,
        scheduler: Arc<dyn Scheduler>,
        listeners: Vec<Listener<T>>,
        metrics: Metrics,
    ) -> Self {
        #[cfg(feature = "async")]
        let (settled_tx, _) = watch::channel(initial.clone());

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state: DebounceState::new(initial, delay),
                    timer: None,
                    disposed: false,
                }),
                scheduler,
                metrics,
                listeners,
                #[cfg(feature = "async")]
                settled_tx,
            }),
        }
    }

    /// Deliver a new input value.
    ///
    /// Cancels the pending settlement, if any, and schedules a new one.
    /// Ignored after [`dispose`](Self::dispose).
    pub fn set(&self, value: T) {
        let mut core = self.shared.lock();
        if core.disposed {
            trace!("set on disposed debouncer ignored");
            return;
        }
        self.shared.metrics.record_call();

        if let Some(timer) = core.timer.take() {
            timer.cancel();
        }

        let ticket = core.state.push(value);
        if ticket.superseded {
            self.shared.metrics.record_superseded();
            trace!("pending input superseded");
        }
        core.timer = Some(self.schedule(ticket));
    }

    /// The current settled value.
    pub fn get(&self) -> T {
        self.shared.lock().state.current().clone()
    }

    /// Check if an input is waiting to settle.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().state.has_pending()
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.shared.lock().state.delay()
    }

    /// Change the quiet period.
    ///
    /// A pending input is rescheduled to settle one full new `delay` from now.
    /// Ignored after [`dispose`](Self::dispose).
    pub fn set_delay(&self, delay: Duration) {
        let mut core = self.shared.lock();
        if core.disposed {
            trace!("set_delay on disposed debouncer ignored");
            return;
        }
        if let Some(timer) = core.timer.take() {
            timer.cancel();
        }

        if let Some(ticket) = core.state.set_delay(delay) {
            if ticket.superseded {
                self.shared.metrics.record_superseded();
                trace!("pending settlement rescheduled");
            }
            core.timer = Some(self.schedule(ticket));
        }
        debug!(delay_ms = delay.as_millis() as u64, "debounce delay changed");
    }

    /// Observe settled values asynchronously.
    ///
    /// The receiver starts out holding the current settled value.
    #[cfg(feature = "async")]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.shared.settled_tx.subscribe()
    }

    /// Cancel any pending settlement and stop accepting input.
    ///
    /// The settled value stays readable. Idempotent.
    pub fn dispose(&self) {
        let mut core = self.shared.lock();
        if core.disposed {
            return;
        }
        core.disposed = true;

        if let Some(timer) = core.timer.take() {
            timer.cancel();
        }
        if core.state.cancel() {
            self.shared.metrics.record_cancelled();
            trace!("pending input discarded");
        }
        debug!("debouncer disposed");
    }

    /// Check if the debouncer has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.shared.lock().disposed
    }

    /// Input and settlement counters.
    pub fn metrics(&self) -> &Metrics {
        &self.shared.metrics
    }

    fn schedule(&self, ticket: SettleTicket) -> TimerHandle {
        let generation = ticket.generation;
        let shared = Arc::downgrade(&self.shared);
        trace!(generation, delay_ms = ticket.after.as_millis() as u64, "settlement scheduled");
        self.shared
            .scheduler
            .schedule(ticket.after, Box::new(move || settle(&shared, generation)))
    }
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Core<T>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn settle<T: Clone>(shared: &Weak<Shared<T>>, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let settled = {
        let mut core = shared.lock();
        if core.disposed {
            return;
        }
        match core.state.settle(generation) {
            Some(value) => {
                core.timer = None;
                shared.metrics.record_deferred();
                #[cfg(feature = "async")]
                let _ = shared.settled_tx.send_replace(value.clone());
                value
            }
            None => {
                trace!(generation, "stale settlement ignored");
                return;
            }
        }
    };

    trace!(generation, "value settled");
    for listener in &shared.listeners {
        listener(&settled);
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.lock();
        f.debug_struct("Debouncer")
            .field("current", core.state.current())
            .field("delay", &core.state.delay())
            .field("pending", &core.state.has_pending())
            .field("disposed", &core.disposed)
            .finish()
    }
}
