//! # pacekeeper
//!
//! Debounced values and trailing-edge throttled callbacks with an explicit
//! create/dispose lifecycle.
//!
//! - A [`Debouncer`] holds a value that only settles once its input has been
//!   quiet for a configured delay.
//! - A [`Throttler`] wraps a callback so it runs at most once per delay: the
//!   first call runs immediately and calls inside the window collapse into one
//!   trailing call carrying the latest arguments.
//!
//! Both own at most one pending timer. Disposing (or dropping) either one
//! cancels that timer, and a timer that was already in flight is ignored when
//! it fires.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pacekeeper::{Debouncer, Throttler};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! // Settle a search query 300ms after the user stops typing
//! let query = Debouncer::builder(String::new())
//!     .with_delay(Duration::from_millis(300))
//!     .with_listener(|q: &String| println!("search: {q}"))
//!     .build()
//!     .unwrap();
//!
//! query.set("r".into());
//! query.set("ru".into());
//! query.set("rust".into()); // only this one settles
//!
//! // Report scroll position at most every 100ms
//! let on_scroll = Throttler::builder(|y: f64| println!("scroll: {y}"))
//!     .with_delay(Duration::from_millis(100))
//!     .build()
//!     .unwrap();
//!
//! on_scroll.call(10.0); // runs now
//! on_scroll.call(20.0); // dropped
//! on_scroll.call(30.0); // runs 100ms after the first call
//! # }
//! ```
//!
//! ## Throttle timeline
//!
//! With `delay = 100ms` and calls at `t = 0, 10, 20, 30`:
//!
//! ```text
//! t=0    call(a)  -> callback(a)             leading
//! t=10   call(b)  -> trailing scheduled @100
//! t=20   call(c)  -> b dropped, c @100
//! t=30   call(d)  -> c dropped, d @100
//! t=100           -> callback(d)             trailing
//! ```
//!
//! ## Runtimes
//!
//! With the default `async` feature the builders use [`TokioScheduler`] and
//! [`TokioClock`] from the current tokio runtime. Any other event loop can
//! drive the utilities by implementing [`Scheduler`] and [`Clock`].
//!
//! ## Testing
//!
//! The `test-helpers` feature exposes `infrastructure::mocks::ManualScheduler`,
//! a virtual-time scheduler that fires timers when the test advances time:
//!
//! ```rust
//! # #[cfg(feature = "test-helpers")]
//! # {
//! use pacekeeper::infrastructure::mocks::ManualScheduler;
//! use pacekeeper::Throttler;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let scheduler = ManualScheduler::new();
//! let runs = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&runs);
//!
//! let throttler = Throttler::builder(move |_: ()| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! })
//! .with_delay(Duration::from_millis(100))
//! .with_scheduler(Arc::new(scheduler.clone()))
//! .with_clock(Arc::new(scheduler.clock()))
//! .build()
//! .unwrap();
//!
//! throttler.call(());
//! throttler.call(());
//! assert_eq!(runs.load(Ordering::SeqCst), 1);
//!
//! scheduler.advance(Duration::from_millis(100));
//! assert_eq!(runs.load(Ordering::SeqCst), 2);
//! # }
//! ```
//!
//! ## Observability
//!
//! Every instance counts calls, immediate and deferred invocations, and
//! superseded or cancelled timers:
//!
//! ```rust,no_run
//! # use pacekeeper::Throttler;
//! # fn report(throttler: &Throttler<()>) {
//! let snapshot = throttler.metrics().snapshot();
//! println!("coalesced: {:.1}%", snapshot.coalescing_rate() * 100.0);
//! # }
//! ```
//!
//! Internally the crate logs through `tracing` at `trace` and `debug` level.
//! [`init_tracing`] installs a formatter configured from a
//! [`MonitoringConfig`].

// Domain layer - pure timing logic
pub mod domain;

// Application layer - services and ports
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

pub use domain::{
    debounce::{DebounceState, SettleTicket},
    delay::{delay_from_millis, DelayError},
    throttle::{ThrottleDecision, ThrottleOutcome, ThrottlePhase, ThrottleState, ThrottleWindow},
};

pub use application::{
    debouncer::{Debouncer, Listener},
    error_slot::ErrorSlot,
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, Scheduler, TimerHandle, TimerTask},
    throttler::{Callback, Throttler},
};

pub use infrastructure::{
    builder::{BuildError, DebouncerBuilder, ThrottlerBuilder, DEFAULT_DELAY},
    clock::SystemClock,
    monitoring::{init_tracing, ConfigError, Environment, InitError, MonitoringConfig},
};

#[cfg(feature = "async")]
pub use infrastructure::{clock::TokioClock, scheduler::TokioScheduler};
