//! Session Configuration
//!
//! Defaults for auto-waiting and for the select2 retry budget. Every field has
//! a default, so a config file only needs the values it changes:
//!
//! ```yaml
//! max_retries: 5
//! retry_interval_ms: 500
//! on_exhausted: fail
//! ```

use crate::locator::{LocatorOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{Select2Error, Select2Result};
use crate::wait::{ExhaustionPolicy, RetryBudget, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Page-global marker present while select2 is fetching results
pub const DEFAULT_LOADING_SELECTOR: &str = ".loading_results";

/// Placeholder option texts rendered while results stream in
pub const DEFAULT_PLACEHOLDER_TEXTS: [&str; 2] = ["Searching…", "Searching..."];

/// Configuration shared by every call made through a [`crate::Session`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Select2Config {
    /// Auto-wait timeout for element lookups (ms)
    pub wait_timeout_ms: u64,
    /// Auto-wait polling interval (ms)
    pub poll_interval_ms: u64,
    /// Retries for transient loading states
    pub max_retries: u32,
    /// Sleep between transient-state retries (ms)
    pub retry_interval_ms: u64,
    /// Behavior when the retry budget runs out
    pub on_exhausted: ExhaustionPolicy,
    /// Selector of the page-global loading marker
    pub loading_selector: String,
    /// Option texts that mean "results not rendered yet"
    pub placeholder_texts: Vec<String>,
}

impl Default for Select2Config {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            on_exhausted: ExhaustionPolicy::Proceed,
            loading_selector: DEFAULT_LOADING_SELECTOR.to_string(),
            placeholder_texts: DEFAULT_PLACEHOLDER_TEXTS
                .iter()
                .map(|text| (*text).to_string())
                .collect(),
        }
    }
}

impl Select2Config {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Select2Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Select2Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Select2Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Check the values make sense together
    pub fn validate(&self) -> Select2Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Select2Error::configuration(
                "poll_interval_ms must be greater than zero",
            ));
        }
        if self.loading_selector.trim().is_empty() {
            return Err(Select2Error::configuration(
                "loading_selector must not be empty",
            ));
        }
        Ok(())
    }

    /// Set the auto-wait timeout
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the retry budget defaults
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, interval: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the exhaustion policy
    #[must_use]
    pub const fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.on_exhausted = policy;
        self
    }

    /// Auto-wait options derived from this config
    #[must_use]
    pub const fn locator_options(&self) -> LocatorOptions {
        LocatorOptions {
            timeout: Duration::from_millis(self.wait_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    /// Default retry budget derived from this config
    #[must_use]
    pub const fn retry_budget(&self) -> RetryBudget {
        RetryBudget::new(
            self.max_retries,
            Duration::from_millis(self.retry_interval_ms),
        )
        .with_policy(self.on_exhausted)
    }

    /// Whether `text` is one of the loading placeholder texts
    #[must_use]
    pub fn is_placeholder(&self, text: &str) -> bool {
        self.placeholder_texts.iter().any(|p| p == text)
    }
}
