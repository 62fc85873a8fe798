//! Per-call options for [`super::select`] and [`super::filter`].

use crate::config::Select2Config;
use crate::result::{Select2Error, Select2Result};
use crate::wait::{ExhaustionPolicy, RetryBudget};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Text comparison used to pick options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Option text equals the value
    #[default]
    Exact,
    /// Option text contains the value, case-sensitive
    ContainsCs,
    /// Option text contains the value, ignoring case
    ContainsCi,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::ContainsCs => write!(f, "contains_cs"),
            Self::ContainsCi => write!(f, "contains_ci"),
        }
    }
}

/// Options for one widget interaction.
///
/// Exactly one of `xpath`, `css`, `label` and `field_id` addresses the
/// widget. Everything else is optional:
///
/// ```ignore
/// let options = Select2Options::new()
///     .with_label("Fruit")
///     .with_search(true)
///     .with_match_mode(MatchMode::ContainsCi);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Select2Options {
    /// XPath of the widget container
    pub xpath: Option<String>,
    /// CSS selector of the widget container
    pub css: Option<String>,
    /// Text of the `<label>` next to the widget
    pub label: Option<String>,
    /// `id` the widget's `<label for=...>` points at
    pub field_id: Option<String>,
    /// Type the value into the search box first
    pub search: bool,
    /// How option text is compared with the value
    pub match_mode: MatchMode,
    /// Interval between loading-state retries (seconds)
    pub wait_seconds: Option<f64>,
    /// Retries for loading states
    pub max_retries: Option<u32>,
    /// Fixed settle sleep before options are read (seconds)
    pub sleep_seconds: Option<f64>,
    /// Wait for a matching option to render before matching
    pub await_option: bool,
    /// Number of matching options `await_option` waits for
    pub expect_elements: Option<usize>,
    /// Fail instead of proceeding when loading never clears
    pub strict_loading: bool,
}

impl Select2Options {
    /// Empty options; set a container locator before use
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the widget by XPath
    #[must_use]
    pub fn with_xpath(mut self, xpath: impl Into<String>) -> Self {
        self.xpath = Some(xpath.into());
        self
    }

    /// Address the widget by CSS selector
    #[must_use]
    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Address the widget by its label text
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Address the widget by the field id its label is `for`
    #[must_use]
    pub fn with_field_id(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    /// Type the value into the search box
    #[must_use]
    pub const fn with_search(mut self, search: bool) -> Self {
        self.search = search;
        self
    }

    /// Set the match mode
    #[must_use]
    pub const fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Set the loading retry interval in seconds
    #[must_use]
    pub fn with_wait_seconds(mut self, seconds: f64) -> Self {
        self.wait_seconds = Some(seconds);
        self
    }

    /// Set the loading retry count
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sleep this many seconds before reading options
    #[must_use]
    pub fn with_sleep_seconds(mut self, seconds: f64) -> Self {
        self.sleep_seconds = Some(seconds);
        self
    }

    /// Wait for a matching option before matching
    #[must_use]
    pub const fn with_await_option(mut self, await_option: bool) -> Self {
        self.await_option = await_option;
        self
    }

    /// Expected number of matching options for `await_option`
    #[must_use]
    pub const fn with_expect_elements(mut self, count: usize) -> Self {
        self.expect_elements = Some(count);
        self
    }

    /// Fail with a loading timeout instead of proceeding
    #[must_use]
    pub const fn with_strict_loading(mut self, strict: bool) -> Self {
        self.strict_loading = strict;
        self
    }

    /// Retry budget for this call, starting from the session defaults
    pub fn retry_budget(&self, config: &Select2Config) -> Select2Result<RetryBudget> {
        let mut budget = config.retry_budget();
        if let Some(retries) = self.max_retries {
            budget.max_retries = retries;
        }
        if let Some(interval) = seconds("wait_seconds", self.wait_seconds)? {
            budget.interval = interval;
        }
        if self.strict_loading {
            budget.on_exhausted = ExhaustionPolicy::Fail;
        }
        Ok(budget)
    }

    /// Settle sleep before options are read
    pub fn settle_delay(&self) -> Select2Result<Option<Duration>> {
        seconds("sleep_seconds", self.sleep_seconds)
    }

    /// Matching-option count `await_option` waits for; `None` means "at least one".
    ///
    /// Contains modes default to exactly one, since more would be ambiguous.
    #[must_use]
    pub fn expected_matches(&self) -> Option<usize> {
        match self.match_mode {
            MatchMode::Exact => self.expect_elements,
            MatchMode::ContainsCs | MatchMode::ContainsCi => self.expect_elements.or(Some(1)),
        }
    }
}

fn seconds(field: &str, value: Option<f64>) -> Select2Result<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_from_secs_f64(secs).map_err(|_| {
                Select2Error::configuration(format!(
                    "{field} must be a finite, non-negative number of seconds (got {secs})"
                ))
            })
        })
        .transpose()
}
