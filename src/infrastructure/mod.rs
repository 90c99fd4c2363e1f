//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time, tokio time, mock)
//! - Timer scheduling (tokio tasks, virtual time)
//! - Builders choosing default adapters
//! - Monitoring configuration and tracing setup

pub mod builder;
pub mod clock;
pub mod monitoring;

#[cfg(feature = "async")]
pub mod scheduler;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds. It provides a controllable clock and a virtual-time
/// scheduler for deterministic tests.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// pacekeeper = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
