//! Trailing-edge throttling.
//!
//! The throttle allows one invocation per window (measured from the last
//! invocation). Calls that arrive inside the window are coalesced into a single
//! trailing invocation that carries the arguments of the most recent call.
//!
//! Everything here is pure: time is passed in, and "scheduling" is expressed as
//! a decision the caller acts upon.

use std::time::{Duration, Instant};

/// Observable state of a throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottlePhase {
    /// The window has elapsed (or nothing was ever invoked); the next call runs immediately
    Idle,
    /// Inside the window with no trailing call scheduled
    CooldownWithoutPending,
    /// Inside the window with a trailing call scheduled
    CooldownWithPending,
}

/// Minimum spacing between invocations.
///
/// # Example
/// ```
/// use pacekeeper::ThrottleWindow;
/// use std::time::{Duration, Instant};
///
/// let mut window = ThrottleWindow::new(Duration::from_millis(100));
/// let start = Instant::now();
///
/// // Nothing invoked yet: the window is open
/// assert_eq!(window.remaining(start), Duration::ZERO);
///
/// window.record_invocation(start);
/// assert_eq!(
///     window.remaining(start + Duration::from_millis(30)),
///     Duration::from_millis(70)
/// );
/// assert_eq!(window.remaining(start + Duration::from_millis(100)), Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct ThrottleWindow {
    delay: Duration,
    last_invoked_at: Option<Instant>,
}

impl ThrottleWindow {
    /// Create a window that has never been invoked.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_invoked_at: None,
        }
    }

    /// The configured minimum spacing.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the spacing. The last invocation time is kept.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// When the callback last ran, if ever.
    pub fn last_invoked_at(&self) -> Option<Instant> {
        self.last_invoked_at
    }

    /// Time left until the next immediate invocation is allowed.
    ///
    /// Returns `Duration::ZERO` when `now - last_invoked_at >= delay`.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_invoked_at {
            None => Duration::ZERO,
            Some(last) => self
                .delay
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Record that the callback ran at `at`.
    pub fn record_invocation(&mut self, at: Instant) {
        self.last_invoked_at = Some(at);
    }
}

/// What the caller must do with a throttled call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleDecision<A> {
    /// Invoke the callback now with these arguments
    InvokeNow(A),
    /// Schedule a timer for `generation` that fires after `after`
    Deferred {
        /// Generation to hand back to [`ThrottleState::fire`]
        generation: u64,
        /// Delay until the trailing invocation
        after: Duration,
    },
}

impl<A> ThrottleDecision<A> {
    /// Check if the decision is to invoke immediately.
    pub fn is_immediate(&self) -> bool {
        matches!(self, ThrottleDecision::InvokeNow(_))
    }

    /// Check if the decision is to defer to a trailing invocation.
    pub fn is_deferred(&self) -> bool {
        matches!(self, ThrottleDecision::Deferred { .. })
    }
}

/// Result of registering a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleOutcome<A> {
    /// What to do with this call
    pub decision: ThrottleDecision<A>,
    /// Whether a previously pending trailing call was dropped
    pub superseded: bool,
}

#[derive(Debug, Clone)]
struct PendingCall<A> {
    generation: u64,
    args: A,
}

/// Throttle state for a single callback.
///
/// Holds the invocation window and at most one pending trailing call.
///
/// # Example
/// ```
/// use pacekeeper::{ThrottleDecision, ThrottleState};
/// use std::time::{Duration, Instant};
///
/// let mut state = ThrottleState::new(Duration::from_millis(100));
/// let t0 = Instant::now();
///
/// // Leading call runs immediately
/// let first = state.request("a", t0);
/// assert_eq!(first.decision, ThrottleDecision::InvokeNow("a"));
///
/// // Calls inside the window are deferred; the latest one wins
/// let second = state.request("b", t0 + Duration::from_millis(10));
/// let third = state.request("c", t0 + Duration::from_millis(30));
/// assert!(third.superseded);
///
/// let ThrottleDecision::Deferred { generation, after } = third.decision else {
///     unreachable!()
/// };
/// assert_eq!(after, Duration::from_millis(70));
///
/// // The superseded generation is stale
/// if let ThrottleDecision::Deferred { generation: stale, .. } = second.decision {
///     assert_eq!(state.fire(stale, t0 + Duration::from_millis(90)), None);
/// }
/// assert_eq!(state.fire(generation, t0 + Duration::from_millis(100)), Some("c"));
/// ```
#[derive(Debug, Clone)]
pub struct ThrottleState<A> {
    window: ThrottleWindow,
    pending: Option<PendingCall<A>>,
    next_generation: u64,
}

impl<A> ThrottleState<A> {
    /// Create a throttle with the given minimum spacing.
    pub fn new(delay: Duration) -> Self {
        Self {
            window: ThrottleWindow::new(delay),
            pending: None,
            next_generation: 0,
        }
    }

    /// Register a call at `now`.
    ///
    /// Any pending trailing call is dropped first. If the window has elapsed
    /// the invocation is recorded at `now` and the arguments are handed back
    /// for immediate use; otherwise the arguments become the pending trailing
    /// call.
    pub fn request(&mut self, args: A, now: Instant) -> ThrottleOutcome<A> {
        let superseded = self.pending.take().is_some();
        let remaining = self.window.remaining(now);

        let decision = if remaining.is_zero() {
            self.window.record_invocation(now);
            ThrottleDecision::InvokeNow(args)
        } else {
            let generation = self.next_generation;
            self.next_generation = self.next_generation.wrapping_add(1);
            self.pending = Some(PendingCall { generation, args });
            ThrottleDecision::Deferred {
                generation,
                after: remaining,
            }
        };

        ThrottleOutcome {
            decision,
            superseded,
        }
    }

    /// A timer for `generation` fired at `now`.
    ///
    /// Returns the arguments to invoke with if `generation` is still the
    /// pending one, recording the invocation at `now`. Stale generations
    /// return `None` and leave the state untouched.
    pub fn fire(&mut self, generation: u64, now: Instant) -> Option<A> {
        match self.pending.take() {
            Some(call) if call.generation == generation => {
                self.window.record_invocation(now);
                Some(call.args)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// Drop the pending trailing call, if any.
    ///
    /// Returns true if a call was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Check if a trailing call is pending.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Current phase at `now`.
    pub fn phase(&self, now: Instant) -> ThrottlePhase {
        if self.pending.is_some() {
            ThrottlePhase::CooldownWithPending
        } else if self.window.last_invoked_at().is_some() && !self.window.remaining(now).is_zero()
        {
            ThrottlePhase::CooldownWithoutPending
        } else {
            ThrottlePhase::Idle
        }
    }

    /// The invocation window.
    pub fn window(&self) -> &ThrottleWindow {
        &self.window
    }

    /// Change the minimum spacing. The last invocation time is kept.
    pub fn set_delay(&mut self, delay: Duration) {
        self.window.set_delay(delay);
    }
}
