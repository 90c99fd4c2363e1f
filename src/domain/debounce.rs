//! Debounced values.
//!
//! A debounced value only takes on an input once that input has been left
//! alone for the quiet period. Each new input replaces the pending one and
//! restarts the quiet period.

use std::time::Duration;

/// A scheduled settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleTicket {
    /// Generation to hand back to [`DebounceState::settle`]
    pub generation: u64,
    /// Quiet period after which the settlement fires
    pub after: Duration,
    /// Whether an earlier pending input was dropped
    pub superseded: bool,
}

#[derive(Debug, Clone)]
struct PendingInput<T> {
    generation: u64,
    value: T,
}

/// Debounce state for a single value.
///
/// # Example
/// ```
/// use pacekeeper::DebounceState;
/// use std::time::Duration;
///
/// let mut state = DebounceState::new(String::new(), Duration::from_millis(300));
///
/// let first = state.push("r".to_string());
/// let second = state.push("ru".to_string());
/// assert!(second.superseded);
///
/// // The first settlement was superseded and never commits
/// assert_eq!(state.settle(first.generation), None);
/// assert_eq!(state.current(), "");
///
/// assert_eq!(state.settle(second.generation).as_deref(), Some("ru"));
/// assert_eq!(state.current(), "ru");
/// ```
#[derive(Debug, Clone)]
pub struct DebounceState<T> {
    current: T,
    delay: Duration,
    pending: Option<PendingInput<T>>,
    next_generation: u64,
}

impl<T> DebounceState<T> {
    /// Create a debounce state holding `initial` as its settled value.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            current: initial,
            delay,
            pending: None,
            next_generation: 0,
        }
    }

    /// The settled value.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Check if an input is waiting to settle.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Deliver a new input value, replacing any pending one.
    pub fn push(&mut self, value: T) -> SettleTicket {
        let superseded = self.pending.is_some();
        let generation = self.issue_generation();
        self.pending = Some(PendingInput { generation, value });

        SettleTicket {
            generation,
            after: self.delay,
            superseded,
        }
    }

    /// Change the quiet period.
    ///
    /// If an input is pending it gets a fresh generation so that it settles
    /// one full new `delay` from now; the returned ticket must replace the
    /// previous timer. Returns `None` when nothing is pending.
    pub fn set_delay(&mut self, delay: Duration) -> Option<SettleTicket> {
        self.delay = delay;
        let generation = self.issue_generation();
        let pending = self.pending.as_mut()?;
        pending.generation = generation;

        Some(SettleTicket {
            generation,
            after: delay,
            superseded: true,
        })
    }

    /// Drop the pending input, if any. Returns true if one was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn issue_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }
}

impl<T: Clone> DebounceState<T> {
    /// The settlement for `generation` fired.
    ///
    /// Commits the pending value and returns a copy of it if `generation` is
    /// still current. Stale generations return `None`.
    pub fn settle(&mut self, generation: u64) -> Option<T> {
        match self.pending.take() {
            Some(input) if input.generation == generation => {
                self.current = input.value;
                Some(self.current.clone())
            }
            other => {
                self.pending = other;
                None
            }
        }
    }
}
