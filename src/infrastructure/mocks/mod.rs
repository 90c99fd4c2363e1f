//! Mock implementations for testing.
//!
//! This module provides test doubles for infrastructure adapters,
//! enabling deterministic testing of timing behavior in virtual time.

pub mod clock;
pub mod scheduler;

pub use clock::MockClock;
pub use scheduler::ManualScheduler;
