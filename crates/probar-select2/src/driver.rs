//! PageDriver - Abstract Page Automation Trait
//!
//! The select2 routine never talks to a browser directly. Everything it does to
//! the page goes through this trait, so the same code runs against a real
//! Chromium tab (`browser` feature) or the in-memory [`crate::mock::MockPage`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Session (auto-wait, strictness, text normalization)         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  PageDriver (snapshot queries, text, click, keys, sleep)     │
//! │  ┌────────────────────┐        ┌────────────────────┐        │
//! │  │  ChromiumPage      │        │  MockPage          │        │
//! │  │  (CDP)             │        │  (unit tests)      │        │
//! │  └────────────────────┘        └────────────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::locator::Query;
use crate::result::Select2Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Element handle for DOM interactions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier for the element
    pub id: String,
    /// Element tag name (lowercase)
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

/// Synchronous page automation primitives.
///
/// Implementations only report what is on the page right now; waiting and
/// strictness live in [`crate::Session`].
pub trait PageDriver {
    /// All visible elements matching `query`, in document order.
    ///
    /// With a scope, CSS results are restricted to descendants of the scope
    /// and XPath expressions are evaluated relative to it.
    fn query_all(
        &mut self,
        scope: Option<&ElementHandle>,
        query: Query<'_>,
    ) -> Select2Result<Vec<ElementHandle>>;

    /// Rendered text of the element
    fn text(&mut self, element: &ElementHandle) -> Select2Result<String>;

    /// Click the element
    fn click(&mut self, element: &ElementHandle) -> Select2Result<()>;

    /// Type keys into the element
    fn send_keys(&mut self, element: &ElementHandle, keys: &str) -> Select2Result<()>;

    /// Block for `duration`
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<D: PageDriver + ?Sized> PageDriver for &mut D {
    fn query_all(
        &mut self,
        scope: Option<&ElementHandle>,
        query: Query<'_>,
    ) -> Select2Result<Vec<ElementHandle>> {
        (**self).query_all(scope, query)
    }

    fn text(&mut self, element: &ElementHandle) -> Select2Result<String> {
        (**self).text(element)
    }

    fn click(&mut self, element: &ElementHandle) -> Select2Result<()> {
        (**self).click(element)
    }

    fn send_keys(&mut self, element: &ElementHandle, keys: &str) -> Select2Result<()> {
        (**self).send_keys(element, keys)
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_handle_creation() {
        let elem = ElementHandle::new("node-3", "li");
        assert_eq!(elem.id, "node-3");
        assert_eq!(elem.tag_name, "li");
    }

    #[test]
    fn test_element_handle_roundtrips_through_json() {
        let json = r#"{"id":"7","tag_name":"span"}"#;
        let elem: ElementHandle = serde_json::from_str(json).unwrap();
        assert_eq!(elem, ElementHandle::new("7", "span"));
    }
}
