//! Result and error types for probar-select2.

use thiserror::Error;

/// Result type for select2 operations
pub type Select2Result<T> = Result<T, Select2Error>;

/// Errors that can occur while driving a select2 widget
#[derive(Debug, Error)]
pub enum Select2Error {
    /// Caller supplied an invalid option set (never retried)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// No element (container, trigger, or option) could be found
    #[error("{message}")]
    ElementNotFound {
        /// Error message
        message: String,
    },

    /// More than one element matched where exactly one was required
    #[error("{message}")]
    Ambiguous {
        /// Error message
        message: String,
        /// Number of candidates: matching elements for a lookup, rendered
        /// options for an option match
        count: usize,
    },

    /// Widget was still loading when the retry budget ran out
    #[error("{what} still pending after {attempts} attempts")]
    LoadingTimeout {
        /// What was being waited for
        what: String,
        /// Number of checks performed
        attempts: u32,
    },

    /// Retrying assertion gave up
    #[error("Assertion failed after {attempts} attempts: {message}")]
    AssertionFailed {
        /// Last failure message
        message: String,
        /// Number of checks performed
        attempts: u32,
    },

    /// Underlying page driver failed
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Match pattern could not be compiled
    #[error("Invalid match pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {message}")]
    Yaml {
        /// Error message
        message: String,
    },
}

impl Select2Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not-found error
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ElementNotFound {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Whether this is a configuration error
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Whether this is a not-found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }

    /// Whether this is an ambiguity error
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

impl From<serde_yaml_ng::Error> for Select2Error {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}
