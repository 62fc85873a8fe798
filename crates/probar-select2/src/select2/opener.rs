//! Expanding the widget by clicking its trigger.

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Selector;
use crate::result::Select2Result;
use crate::session::Session;
use std::fmt;
use tracing::debug;

/// Clickable region that expands the dropdown, per markup version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerVariant {
    /// `.select2-selection` (select2 4.x)
    Selection,
    /// `.select2-choice` (3.x single select)
    Choice,
    /// `.select2-choices` (3.x multi select)
    Choices,
}

impl TriggerVariant {
    /// Detection order; the last variant is assumed without a check
    pub const DETECTION_ORDER: [Self; 3] = [Self::Selection, Self::Choice, Self::Choices];

    /// CSS selector of the trigger inside the container
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Selection => ".select2-selection",
            Self::Choice => ".select2-choice",
            Self::Choices => ".select2-choices",
        }
    }

    /// First variant present in `container` right now
    pub fn detect<D: PageDriver>(
        session: &mut Session<D>,
        container: &ElementHandle,
    ) -> Select2Result<Self> {
        let [checked @ .., assumed] = Self::DETECTION_ORDER;
        for variant in checked {
            if session.has_selector_now(Some(container), &Selector::css(variant.selector()))? {
                return Ok(variant);
            }
        }
        Ok(assumed)
    }
}

impl fmt::Display for TriggerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

/// Click the trigger of `container`, returning the variant that was clicked.
///
/// # Errors
///
/// [`crate::Select2Error::ElementNotFound`] if the container has none of the
/// known triggers.
pub fn open<D: PageDriver>(
    session: &mut Session<D>,
    container: &ElementHandle,
) -> Select2Result<TriggerVariant> {
    let variant = TriggerVariant::detect(session, container)?;
    let trigger = session.find(Some(container), &Selector::css(variant.selector()))?;
    session.click(&trigger)?;
    debug!(%variant, "opened select2");
    Ok(variant)
}
