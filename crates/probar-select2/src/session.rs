//! Session: the explicit page handle threaded through every operation.
//!
//! Lookups follow locator semantics:
//!
//! - [`Session::find`] auto-waits for the element and is strict (more than one
//!   match fails immediately, since waiting cannot resolve a duplicate)
//! - [`Session::find_all`] and the `_now` variants take a single snapshot
//! - [`Session::has_selector`] waits for presence, returning `false` on timeout

use crate::config::Select2Config;
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{normalize_text, LocatorOptions, Selector};
use crate::result::{Select2Error, Select2Result};
use crate::wait::{PollOutcome, RetryBudget};
use std::time::Duration;
use tracing::trace;

/// A page driver plus the configuration used to drive it
#[derive(Debug)]
pub struct Session<D: PageDriver> {
    driver: D,
    config: Select2Config,
}

impl<D: PageDriver> Session<D> {
    /// Create a session with default configuration
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, Select2Config::default())
    }

    /// Create a session with custom configuration
    #[must_use]
    pub const fn with_config(driver: D, config: Select2Config) -> Self {
        Self { driver, config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &Select2Config {
        &self.config
    }

    /// Get the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Get the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Consume the session, returning the driver
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    fn locator_options(&self) -> LocatorOptions {
        self.config.locator_options()
    }

    /// Visible matches right now, with any text filter applied
    pub fn find_all(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Select2Result<Vec<ElementHandle>> {
        let found = self.driver.query_all(scope, selector.query())?;
        let Some(needle) = selector.text_filter() else {
            return Ok(found);
        };
        let needle = normalize_text(needle);
        let mut kept = Vec::with_capacity(found.len());
        for element in found {
            if self.text(&element)?.contains(&needle) {
                kept.push(element);
            }
        }
        Ok(kept)
    }

    /// Exactly one element, waiting for it to render.
    ///
    /// # Errors
    ///
    /// - [`Select2Error::ElementNotFound`] if nothing matched before the timeout
    /// - [`Select2Error::Ambiguous`] as soon as more than one element matches
    pub fn find(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Select2Result<ElementHandle> {
        let options = self.locator_options();
        let max_attempts = options.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let mut found = self.find_all(scope, selector)?;
            match found.len() {
                0 if attempt >= max_attempts => {
                    return Err(Select2Error::not_found(format!(
                        "Unable to find {selector}"
                    )));
                }
                0 => {
                    trace!(%selector, attempt, "element not rendered yet");
                    self.sleep(options.poll_interval);
                }
                1 => return Ok(found.remove(0)),
                count => {
                    return Err(Select2Error::Ambiguous {
                        message: format!(
                            "Ambiguous match, found {count} elements matching {selector}"
                        ),
                        count,
                    });
                }
            }
        }
    }

    /// Whether at least one element matches right now
    pub fn has_selector_now(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Select2Result<bool> {
        Ok(!self.find_all(scope, selector)?.is_empty())
    }

    /// Whether at least one element matches, waiting up to the timeout
    pub fn has_selector(
        &mut self,
        scope: Option<&ElementHandle>,
        selector: &Selector,
    ) -> Select2Result<bool> {
        let options = self.locator_options();
        for attempt in 1..=options.max_attempts() {
            if self.has_selector_now(scope, selector)? {
                return Ok(true);
            }
            if attempt < options.max_attempts() {
                self.sleep(options.poll_interval);
            }
        }
        Ok(false)
    }

    /// Normalized rendered text of an element
    pub fn text(&mut self, element: &ElementHandle) -> Select2Result<String> {
        Ok(normalize_text(&self.driver.text(element)?))
    }

    /// Click an element
    pub fn click(&mut self, element: &ElementHandle) -> Select2Result<()> {
        self.driver.click(element)
    }

    /// Type keys into an element
    pub fn send_keys(&mut self, element: &ElementHandle, keys: &str) -> Select2Result<()> {
        self.driver.send_keys(element, keys)
    }

    /// Sleep through the driver
    pub fn sleep(&mut self, duration: Duration) {
        self.driver.sleep(duration);
    }

    /// Poll `busy` until it reports `false` or the budget runs out.
    ///
    /// Performs at most `budget.max_attempts()` checks with one
    /// `budget.interval` sleep between consecutive checks. The exhaustion
    /// policy is not applied here; see [`RetryBudget::settle`].
    pub fn retry_while<F>(&mut self, budget: &RetryBudget, mut busy: F) -> Select2Result<PollOutcome>
    where
        F: FnMut(&mut Self) -> Select2Result<bool>,
    {
        let max_attempts = budget.max_attempts();
        let mut attempts = 0;
        loop {
            attempts += 1;
            if !busy(self)? {
                return Ok(PollOutcome::Settled { attempts });
            }
            if attempts >= max_attempts {
                return Ok(PollOutcome::Exhausted { attempts });
            }
            self.sleep(budget.interval);
        }
    }
}
