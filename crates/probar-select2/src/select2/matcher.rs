//! Option matching and the 0/1/many result policy.

use super::options::MatchMode;
use crate::driver::ElementHandle;
use crate::locator::normalize_text;
use crate::result::{Select2Error, Select2Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// One rendered option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionElement {
    /// Driver handle, used to click the option
    pub handle: ElementHandle,
    /// Normalized rendered text
    pub text: String,
    /// Index among all rendered options
    pub position: usize,
}

/// Compares option text with a target value
#[derive(Debug, Clone)]
pub struct OptionMatcher {
    value: String,
    mode: MatchMode,
    pattern: Option<Regex>,
}

impl OptionMatcher {
    /// Build a matcher; contains modes treat `value` as a literal.
    ///
    /// # Errors
    ///
    /// [`Select2Error::InvalidPattern`] if the escaped pattern exceeds the
    /// regex size limit.
    pub fn new(value: &str, mode: MatchMode) -> Select2Result<Self> {
        let value = normalize_text(value);
        let pattern = match mode {
            MatchMode::Exact => None,
            MatchMode::ContainsCs | MatchMode::ContainsCi => Some(
                RegexBuilder::new(&regex::escape(&value))
                    .case_insensitive(mode == MatchMode::ContainsCi)
                    .build()?,
            ),
        };
        Ok(Self {
            value,
            mode,
            pattern,
        })
    }

    /// Target value (normalized)
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Match mode
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether `text` matches
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(text),
            None => text == self.value,
        }
    }

    /// Matching options, in their original order
    #[must_use]
    pub fn filter(&self, options: Vec<OptionElement>) -> Vec<OptionElement> {
        options
            .into_iter()
            .filter(|option| self.is_match(&option.text))
            .collect()
    }

    /// The single matching option.
    ///
    /// # Errors
    ///
    /// - [`Select2Error::ElementNotFound`] when nothing matches
    /// - [`Select2Error::Ambiguous`] when several do, carrying the number of
    ///   options rendered
    pub fn resolve(&self, options: Vec<OptionElement>) -> Select2Result<OptionElement> {
        let rendered = options.len();
        let mut matches = self.filter(options);
        match matches.len() {
            0 => Err(Select2Error::not_found(format!(
                "Unable to find a matching option for {}",
                self.value
            ))),
            1 => Ok(matches.remove(0)),
            _ => Err(Select2Error::Ambiguous {
                message: format!(
                    "Ambiguous match, found {rendered} options for {}",
                    self.value
                ),
                count: rendered,
            }),
        }
    }
}
