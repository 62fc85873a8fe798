//! Retry Assertions with Polling
//!
//! Auto-retrying assertions for eventually-consistent widget states. The check
//! is handed the session on every attempt, and sleeps go through the session's
//! driver, so the poll is deterministic under [`crate::mock::MockPage`].

use crate::driver::PageDriver;
use crate::result::{Select2Error, Select2Result};
use crate::session::Session;
use std::time::Duration;

/// Result of a retry assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionCheckResult {
    /// Assertion passed
    Pass,
    /// Assertion failed with message
    Fail(String),
}

impl AssertionCheckResult {
    /// Check if the result is a pass
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of checks
    pub max_attempts: u32,
    /// Interval between checks
    pub poll_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    /// Create a retry config
    #[must_use]
    pub const fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }
}

/// Result of a successful retry assertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryResult {
    /// Number of checks performed
    pub attempts: u32,
}

/// A retry assertion that polls until success or the attempt limit.
///
/// ```ignore
/// let result = RetryAssertion::new(|session: &mut Session<MockPage>| -> Select2Result<_> {
///     Ok(if session.has_selector_now(None, &Selector::css(".ready"))? {
///         AssertionCheckResult::Pass
///     } else {
///         AssertionCheckResult::Fail("not ready".into())
///     })
/// })
/// .with_description("ready marker")
/// .verify(&mut session)?;
/// ```
#[derive(Debug)]
pub struct RetryAssertion<F> {
    check: F,
    config: RetryConfig,
    description: Option<String>,
}

impl<F> RetryAssertion<F> {
    /// Create a new retry assertion
    #[must_use]
    pub fn new(check: F) -> Self {
        Self {
            check,
            config: RetryConfig::default(),
            description: None,
        }
    }

    /// Set the full config
    #[must_use]
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a description for the assertion
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Get the current config
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Verify the assertion, retrying until success or the attempt limit.
    ///
    /// Driver errors from the check abort immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Select2Error::AssertionFailed`] with the last failure message
    /// if every attempt fails.
    pub fn verify<D>(mut self, session: &mut Session<D>) -> Select2Result<RetryResult>
    where
        D: PageDriver,
        F: FnMut(&mut Session<D>) -> Select2Result<AssertionCheckResult>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match (self.check)(session)? {
                AssertionCheckResult::Pass => return Ok(RetryResult { attempts }),
                AssertionCheckResult::Fail(message) if attempts >= max_attempts => {
                    let message = match self.description.take() {
                        Some(desc) => format!("{desc}: {message}"),
                        None => message,
                    };
                    return Err(Select2Error::AssertionFailed { message, attempts });
                }
                AssertionCheckResult::Fail(_) => session.sleep(self.config.poll_interval),
            }
        }
    }
}
