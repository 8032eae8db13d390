//! Exponential backoff scheduling for reconnect attempts.
//!
//! The delay for an attempt is `base_delay * 2^attempts_made`, computed
//! before the counter is bumped, so with a 1s base the timers run 1s, 2s,
//! 4s, 8s, 16s. When the counter passes `max_attempts` no timer is armed
//! and the exhaustion is reported once; only [`ReconnectionScheduler::reset`]
//! re-arms the budget.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{self, Sleep};

/// Retry accounting. Mutated only by [`ReconnectionScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBudget {
    /// Attempts since the last successful open.
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl ReconnectBudget {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts_made: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Backoff for the attempt following `attempts` prior ones. Saturates.
    #[must_use]
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempts_made >= self.max_attempts
    }
}

/// Outcome of [`ReconnectionScheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A timer is armed; `attempt` is 1-based.
    Retry { attempt: u32, delay: Duration },
    /// Budget spent. `first_report` is true only the first time.
    Exhausted { first_report: bool },
}

/// Owns the retry budget and the single pending reconnect timer.
#[derive(Debug)]
pub struct ReconnectionScheduler {
    budget: ReconnectBudget,
    exhausted_reported: bool,
    timer: Option<Pin<Box<Sleep>>>,
}

impl ReconnectionScheduler {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            budget: ReconnectBudget::new(max_attempts, base_delay),
            exhausted_reported: false,
            timer: None,
        }
    }

    #[must_use]
    pub const fn budget(&self) -> ReconnectBudget {
        self.budget
    }

    #[must_use]
    pub const fn attempts_made(&self) -> u32 {
        self.budget.attempts_made
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.budget.max_attempts
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.budget.is_exhausted()
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Consume one attempt and arm the timer, or report exhaustion.
    ///
    /// Callers must not schedule while a timer is pending; use
    /// [`is_pending`](Self::is_pending) to guard.
    pub fn schedule(&mut self) -> Schedule {
        let delay = self.budget.delay_for(self.budget.attempts_made);
        self.budget.attempts_made = self.budget.attempts_made.saturating_add(1);

        if self.budget.attempts_made <= self.budget.max_attempts {
            self.timer = Some(Box::pin(time::sleep(delay)));
            return Schedule::Retry {
                attempt: self.budget.attempts_made,
                delay,
            };
        }

        self.timer = None;
        let first_report = !self.exhausted_reported;
        self.exhausted_reported = true;
        Schedule::Exhausted { first_report }
    }

    /// Successful open: the next failure starts from the base delay again.
    pub fn reset(&mut self) {
        self.budget.attempts_made = 0;
        self.exhausted_reported = false;
    }

    /// Manual disconnect: drop any timer and spend the budget so nothing
    /// reconnects until an explicit connect.
    pub fn exhaust(&mut self) {
        self.cancel();
        self.budget.attempts_made = self.budget.max_attempts;
    }

    /// Disarm the pending timer. Returns whether one was pending.
    /// The attempt counter is left as is.
    pub fn cancel(&mut self) -> bool {
        self.timer.take().is_some()
    }

    /// Resolve when the armed timer fires. Pending forever when none is armed.
    pub async fn due(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => std::future::pending().await,
        }
    }
}
