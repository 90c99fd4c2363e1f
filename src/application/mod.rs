//! Application layer - binds domain state to timers.
//!
//! This layer turns the pure state machines into usable services:
//! - Debouncer (settled values published after a quiet period)
//! - Throttler (leading plus trailing invocations)
//! - Metrics (call and invocation counters)
//! - Error slot (boundary to an error display)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from the runtime that actually drives the timers.

pub mod debouncer;
pub mod error_slot;
pub mod metrics;
pub mod ports;
pub mod throttler;
