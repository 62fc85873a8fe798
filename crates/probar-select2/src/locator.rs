//! Selector abstraction for element lookup.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: single-element lookups fail if multiple elements match
//! - **Auto-Waiting**: single-element lookups poll until the element renders
//! - **Driver Neutral**: drivers only ever see raw CSS or XPath; text filters
//!   are applied on normalized text by the session

use std::fmt;
use std::time::Duration;

/// Default timeout for auto-waiting (2 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "li.select2-results__option")
    Css(String),
    /// XPath selector, relative to the scope element when one is given
    XPath(String),
    /// CSS selector filtered by a substring of the element's text
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text the element must contain
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a CSS selector with a text filter
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// The raw query handed to the driver
    #[must_use]
    pub fn query(&self) -> Query<'_> {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => Query::Css(css),
            Self::XPath(xpath) => Query::XPath(xpath),
        }
    }

    /// Text filter applied after the driver query, if any
    #[must_use]
    pub fn text_filter(&self) -> Option<&str> {
        match self {
            Self::CssWithText { text, .. } => Some(text),
            Self::Css(_) | Self::XPath(_) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => write!(f, "css {css:?}"),
            Self::XPath(xpath) => write!(f, "xpath {xpath:?}"),
            Self::CssWithText { css, text } => write!(f, "css {css:?} with text {text:?}"),
        }
    }
}

/// Raw query understood by a [`crate::PageDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    /// CSS selector
    Css(&'a str),
    /// XPath expression
    XPath(&'a str),
}

/// Locator options for customizing auto-wait behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl LocatorOptions {
    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Number of checks an auto-waiting lookup performs before giving up.
    ///
    /// Always at least one, so a zero timeout still looks once.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        let poll = self.poll_interval.as_millis().max(1);
        let polls = self.timeout.as_millis() / poll;
        u32::try_from(polls).unwrap_or(u32::MAX).saturating_add(1)
    }
}

/// Collapse whitespace runs and trim, the way rendered text is compared.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Quote a value for use inside a CSS attribute selector.
#[must_use]
pub fn css_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
