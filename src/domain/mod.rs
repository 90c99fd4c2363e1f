//! Domain layer - pure timing logic with no external dependencies.
//!
//! This layer contains the state machines behind the timing utilities:
//! - Debounced value settlement
//! - Trailing-edge throttling
//! - Delay validation
//!
//! Nothing here owns a timer or reads a clock. Time is passed in and timers
//! are described as generations the caller schedules, which keeps every
//! transition deterministic and easily testable.

pub mod debounce;
pub mod delay;
pub mod throttle;
