//! Builders wiring the services to runtime adapters.
//!
//! The builders pick default adapters (the tokio scheduler and clock when the
//! `async` feature is enabled) and validate configuration in `build()`.

use crate::application::debouncer::{Debouncer, Listener};
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, Scheduler};
use crate::application::throttler::{Callback, Throttler};
use crate::domain::delay::{delay_from_millis, DelayError};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use crate::infrastructure::{clock::TokioClock, scheduler::TokioScheduler};

#[cfg(not(feature = "async"))]
use crate::infrastructure::clock::SystemClock;

/// Delay used when a builder is not given one.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Error returned when building a `Debouncer` or `Throttler` fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The configured delay is invalid
    Delay(DelayError),
    /// No scheduler was configured and no tokio runtime is available
    NoScheduler,
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Delay(e) => write!(f, "invalid delay: {}", e),
            BuildError::NoScheduler => write!(
                f,
                "no scheduler configured and no tokio runtime available"
            ),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Delay(e) => Some(e),
            BuildError::NoScheduler => None,
        }
    }
}

impl From<DelayError> for BuildError {
    fn from(e: DelayError) -> Self {
        BuildError::Delay(e)
    }
}

#[derive(Debug, Clone, Copy)]
enum DelaySetting {
    Exact(Duration),
    Millis(i64),
}

impl DelaySetting {
    fn resolve(self) -> Result<Duration, DelayError> {
        match self {
            DelaySetting::Exact(delay) => Ok(delay),
            DelaySetting::Millis(ms) => delay_from_millis(ms),
        }
    }
}

fn default_scheduler() -> Option<Arc<dyn Scheduler>> {
    #[cfg(feature = "async")]
    {
        TokioScheduler::try_current().map(|s| Arc::new(s) as Arc<dyn Scheduler>)
    }
    #[cfg(not(feature = "async"))]
    {
        None
    }
}

fn default_clock() -> Arc<dyn Clock> {
    #[cfg(feature = "async")]
    {
        Arc::new(TokioClock::new())
    }
    #[cfg(not(feature = "async"))]
    {
        Arc::new(SystemClock::new())
    }
}

/// Builder for constructing a [`Throttler`].
pub struct ThrottlerBuilder<A> {
    callback: Callback<A>,
    delay: DelaySetting,
    scheduler: Option<Arc<dyn Scheduler>>,
    clock: Option<Arc<dyn Clock>>,
}

impl<A: Send + 'static> Throttler<A> {
    /// Create a builder for a throttler wrapping `callback`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use pacekeeper::Throttler;
    /// # use std::time::Duration;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let on_scroll = Throttler::builder(|offset: f64| println!("scrolled to {offset}"))
    ///     .with_delay(Duration::from_millis(100))
    ///     .build()
    ///     .unwrap();
    ///
    /// on_scroll.call(120.0);
    /// # }
    /// ```
    pub fn builder<F>(callback: F) -> ThrottlerBuilder<A>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        ThrottlerBuilder {
            callback: Arc::new(callback),
            delay: DelaySetting::Exact(DEFAULT_DELAY),
            scheduler: None,
            clock: None,
        }
    }
}

impl<A: Send + 'static> ThrottlerBuilder<A> {
    /// Set the minimum spacing between invocations.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = DelaySetting::Exact(delay);
        self
    }

    /// Set the minimum spacing in milliseconds.
    ///
    /// The value will be validated when `build()` is called.
    pub fn with_delay_millis(mut self, ms: i64) -> Self {
        self.delay = DelaySetting::Millis(ms);
        self
    }

    /// Set the scheduler that runs trailing calls.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the throttler.
    ///
    /// # Errors
    /// Returns `BuildError` if the delay is invalid or no scheduler is available.
    pub fn build(self) -> Result<Throttler<A>, BuildError> {
        let delay = self.delay.resolve()?;
        let scheduler = self
            .scheduler
            .or_else(default_scheduler)
            .ok_or(BuildError::NoScheduler)?;
        let clock = self.clock.unwrap_or_else(default_clock);

        Ok(Throttler::from_parts(
            self.callback,
            delay,
            scheduler,
            clock,
            Metrics::new(),
        ))
    }
}

/// Builder for constructing a [`Debouncer`].
pub struct DebouncerBuilder<T> {
    initial: T,
    delay: DelaySetting,
    scheduler: Option<Arc<dyn Scheduler>>,
    listeners: Vec<Listener<T>>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Create a builder for a debouncer whose settled value starts as `initial`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use pacekeeper::Debouncer;
    /// # use std::time::Duration;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let query = Debouncer::builder(String::new())
    ///     .with_delay(Duration::from_millis(300))
    ///     .with_listener(|q: &String| println!("searching for {q}"))
    ///     .build()
    ///     .unwrap();
    ///
    /// query.set("rust".to_string());
    /// # }
    /// ```
    pub fn builder(initial: T) -> DebouncerBuilder<T> {
        DebouncerBuilder {
            initial,
            delay: DelaySetting::Exact(DEFAULT_DELAY),
            scheduler: None,
            listeners: Vec::new(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> DebouncerBuilder<T> {
    /// Set the quiet period.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = DelaySetting::Exact(delay);
        self
    }

    /// Set the quiet period in milliseconds.
    ///
    /// The value will be validated when `build()` is called.
    pub fn with_delay_millis(mut self, ms: i64) -> Self {
        self.delay = DelaySetting::Millis(ms);
        self
    }

    /// Set the scheduler that runs settlements.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Add a listener called with every settled value.
    ///
    /// Listeners run on the scheduler's context, after the settled value
    /// is visible through `get()`.
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Build the debouncer.
    ///
    /// # Errors
    /// Returns `BuildError` if the delay is invalid or no scheduler is available.
    pub fn build(self) -> Result<Debouncer<T>, BuildError> {
        let delay = self.delay.resolve()?;
        let scheduler = self
            .scheduler
            .or_else(default_scheduler)
            .ok_or(BuildError::NoScheduler)?;

        Ok(Debouncer::from_parts(
            self.initial,
            delay,
            scheduler,
            self.listeners,
            Metrics::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::ManualScheduler;
    use std::error::Error;
    use std::sync::Mutex;

    #[test]
    fn test_negative_delay_rejected() {
        let scheduler = ManualScheduler::new();
        let result = Throttler::builder(|_: ()| {})
            .with_delay_millis(-5)
            .with_scheduler(Arc::new(scheduler))
            .build();

        let err = result.unwrap_err();
        assert_eq!(err, BuildError::Delay(DelayError::Negative(-5)));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "invalid delay: delay must not be negative (got -5ms)"
        );
    }

    #[test]
    fn test_no_scheduler_outside_runtime() {
        let result = Debouncer::builder(0u8).build();
        assert!(matches!(result, Err(BuildError::NoScheduler)));
    }

    #[test]
    fn test_default_delay() {
        let scheduler = ManualScheduler::new();
        let debouncer = Debouncer::builder(0u8)
            .with_scheduler(Arc::new(scheduler.clone()))
            .build()
            .unwrap();
        assert_eq!(debouncer.delay(), DEFAULT_DELAY);

        let throttler = Throttler::builder(|_: ()| {})
            .with_scheduler(Arc::new(scheduler.clone()))
            .with_clock(Arc::new(scheduler.clock()))
            .build()
            .unwrap();
        assert_eq!(throttler.delay(), DEFAULT_DELAY);
    }

    #[test]
    fn test_listeners_called_in_order() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);

        let debouncer = Debouncer::builder(String::new())
            .with_delay_millis(50)
            .with_scheduler(Arc::new(scheduler.clone()))
            .with_listener(move |v: &String| first.lock().unwrap().push(format!("a:{v}")))
            .with_listener(move |v: &String| second.lock().unwrap().push(format!("b:{v}")))
            .build()
            .unwrap();

        debouncer.set("x".to_string());
        scheduler.advance(Duration::from_millis(50));

        assert_eq!(*log.lock().unwrap(), vec!["a:x", "b:x"]);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_defaults_to_tokio_inside_runtime() {
        let throttler = Throttler::builder(|_: u8| {}).build();
        assert!(throttler.is_ok());
    }
}
