//! Bounded Wait Mechanisms
//!
//! select2 signals "not ready yet" through page state (a loading marker, a
//! `Searching…` placeholder option). Waiting on that state is always bounded
//! by a [`RetryBudget`]; what happens when the budget runs out is an explicit
//! [`ExhaustionPolicy`].

use crate::result::{Select2Error, Select2Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Default number of retries for transient widget states
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default interval between retries (250ms)
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 250;

/// What to do when a transient state outlives the retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Log a warning and continue with whatever is rendered
    #[default]
    Proceed,
    /// Fail with [`Select2Error::LoadingTimeout`]
    Fail,
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

/// Outcome of a bounded poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The transient state cleared
    Settled {
        /// Checks performed, including the successful one
        attempts: u32,
    },
    /// The budget ran out while the state was still present
    Exhausted {
        /// Checks performed
        attempts: u32,
    },
}

impl PollOutcome {
    /// Number of checks performed
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Settled { attempts } | Self::Exhausted { attempts } => *attempts,
        }
    }

    /// Whether the state cleared in time
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }
}

/// Retry count plus per-attempt wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Retries after the first check (total checks = `max_retries + 1`)
    pub max_retries: u32,
    /// Sleep between checks
    pub interval: Duration,
    /// Exhaustion behavior
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            interval: Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS),
            on_exhausted: ExhaustionPolicy::Proceed,
        }
    }
}

impl RetryBudget {
    /// Create a budget
    #[must_use]
    pub const fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
            on_exhausted: ExhaustionPolicy::Proceed,
        }
    }

    /// Set the exhaustion policy
    #[must_use]
    pub const fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhausted = policy;
        self
    }

    /// Total number of checks this budget allows
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Apply the exhaustion policy to a poll outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Select2Error::LoadingTimeout`] when the outcome is exhausted
    /// and the policy is [`ExhaustionPolicy::Fail`].
    pub fn settle(&self, outcome: PollOutcome, what: &str) -> Select2Result<()> {
        match (outcome, self.on_exhausted) {
            (PollOutcome::Settled { .. }, _) => Ok(()),
            (PollOutcome::Exhausted { attempts }, ExhaustionPolicy::Proceed) => {
                warn!(
                    what,
                    attempts, "retry budget exhausted, continuing with current results"
                );
                Ok(())
            }
            (PollOutcome::Exhausted { attempts }, ExhaustionPolicy::Fail) => {
                Err(Select2Error::LoadingTimeout {
                    what: what.to_string(),
                    attempts,
                })
            }
        }
    }
}
