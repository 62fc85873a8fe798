//! Mock Page for Widget Testing
//!
//! [`MockPage`] implements [`PageDriver`] over an in-memory element tree so the
//! select2 routine can be tested without a browser. Widget behavior is
//! scripted with reactions that mutate the tree:
//!
//! ```ignore
//! let mut page = MockPage::new();
//! let body = page.body();
//! let trigger = page.append(body, MockElement::new("span").class("select2-selection"));
//! let dropdown = page.append(body, MockElement::new("span").class("select2-dropdown").hidden());
//! page.on_click(trigger, move |dom| dom.show(dropdown));
//! ```
//!
//! Sleeps are recorded, never slept, so waiting code runs instantly and its
//! polling can be asserted on.

mod dom;
mod selector;

pub use dom::{MockDom, MockElement, NodeId};

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Query;
use crate::result::{Select2Error, Select2Result};
use selector::{CssSelector, XPathSelector};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

type Reaction = Box<dyn FnMut(&mut MockDom)>;
type KeyReaction = Box<dyn FnMut(&mut MockDom, &str)>;

const HANDLE_PREFIX: &str = "node-";

/// Scriptable in-memory page
#[derive(Default)]
pub struct MockPage {
    dom: MockDom,
    click_reactions: HashMap<NodeId, Vec<Reaction>>,
    key_reactions: HashMap<NodeId, Vec<KeyReaction>>,
    sleep_reactions: Vec<Reaction>,
    /// Call history for verification
    call_history: Vec<String>,
    sleeps: Vec<Duration>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("dom", &self.dom)
            .field("call_history", &self.call_history)
            .field("sleeps", &self.sleeps)
            .finish_non_exhaustive()
    }
}

impl MockPage {
    /// Create a page with an empty body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `<body>` node
    #[must_use]
    pub const fn body(&self) -> NodeId {
        MockDom::BODY
    }

    /// Append an element, returning its node id
    pub fn append(&mut self, parent: NodeId, element: MockElement) -> NodeId {
        self.dom.append(parent, element)
    }

    /// The element tree
    #[must_use]
    pub const fn dom(&self) -> &MockDom {
        &self.dom
    }

    /// The element tree, mutably
    pub fn dom_mut(&mut self) -> &mut MockDom {
        &mut self.dom
    }

    /// Run `reaction` whenever `node` is clicked
    pub fn on_click(&mut self, node: NodeId, reaction: impl FnMut(&mut MockDom) + 'static) {
        self.click_reactions
            .entry(node)
            .or_default()
            .push(Box::new(reaction));
    }

    /// Run `reaction` with the typed keys whenever keys are sent to `node`
    pub fn on_keys(&mut self, node: NodeId, reaction: impl FnMut(&mut MockDom, &str) + 'static) {
        self.key_reactions
            .entry(node)
            .or_default()
            .push(Box::new(reaction));
    }

    /// Run `reaction` on every sleep (one "tick" of page time)
    pub fn on_sleep(&mut self, reaction: impl FnMut(&mut MockDom) + 'static) {
        self.sleep_reactions.push(Box::new(reaction));
    }

    /// Handle for a node, as the driver would hand it out
    #[must_use]
    pub fn handle(&self, node: NodeId) -> ElementHandle {
        let tag = self
            .dom
            .element(node)
            .map(|element| element.tag.clone())
            .unwrap_or_default();
        ElementHandle::new(format!("{HANDLE_PREFIX}{node}"), tag)
    }

    /// Node behind a handle
    pub fn node(&self, handle: &ElementHandle) -> Select2Result<NodeId> {
        handle
            .id
            .strip_prefix(HANDLE_PREFIX)
            .and_then(|raw| raw.parse::<NodeId>().ok())
            .filter(|node| self.dom.is_attached(*node))
            .ok_or_else(|| Select2Error::driver(format!("stale element handle {}", handle.id)))
    }

    fn interactable(&self, handle: &ElementHandle) -> Select2Result<NodeId> {
        let node = self.node(handle)?;
        if self.dom.is_displayed(node) {
            Ok(node)
        } else {
            Err(Select2Error::driver(format!(
                "element {} is not interactable",
                handle.id
            )))
        }
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn calls_to(&self, prefix: &str) -> usize {
        self.call_history
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether `node` was clicked
    #[must_use]
    pub fn was_clicked(&self, node: NodeId) -> bool {
        let entry = format!("click:{HANDLE_PREFIX}{node}");
        self.call_history.iter().any(|c| *c == entry)
    }

    /// Number of sleeps requested
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        self.sleeps.len()
    }

    /// Total time the caller asked to sleep
    #[must_use]
    pub fn total_slept(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

impl PageDriver for MockPage {
    fn query_all(
        &mut self,
        scope: Option<&ElementHandle>,
        query: Query<'_>,
    ) -> Select2Result<Vec<ElementHandle>> {
        let scope = scope.map(|handle| self.node(handle)).transpose()?;
        let nodes = match query {
            Query::Css(css) => {
                self.call_history.push(format!("query_all:css:{css}"));
                let selector = CssSelector::parse(css)?;
                let root = scope.unwrap_or(MockDom::ROOT);
                self.dom
                    .descendants(root)
                    .into_iter()
                    .filter(|node| selector.matches(&self.dom, *node))
                    .collect::<Vec<_>>()
            }
            Query::XPath(xpath) => {
                self.call_history.push(format!("query_all:xpath:{xpath}"));
                XPathSelector::parse(xpath)?.evaluate(&self.dom, scope)
            }
        };
        Ok(nodes
            .into_iter()
            .filter(|node| self.dom.is_displayed(*node))
            .map(|node| self.handle(node))
            .collect())
    }

    fn text(&mut self, element: &ElementHandle) -> Select2Result<String> {
        self.call_history.push(format!("text:{}", element.id));
        let node = self.node(element)?;
        Ok(self.dom.text_of(node))
    }

    fn click(&mut self, element: &ElementHandle) -> Select2Result<()> {
        self.call_history.push(format!("click:{}", element.id));
        let node = self.interactable(element)?;
        if let Some(reactions) = self.click_reactions.get_mut(&node) {
            for reaction in reactions.iter_mut() {
                reaction(&mut self.dom);
            }
        }
        Ok(())
    }

    fn send_keys(&mut self, element: &ElementHandle, keys: &str) -> Select2Result<()> {
        self.call_history
            .push(format!("send_keys:{}:{keys}", element.id));
        let node = self.interactable(element)?;
        let current = self
            .dom
            .element(node)
            .and_then(|el| el.attribute("value"))
            .unwrap_or_default();
        self.dom.set_attr(node, "value", format!("{current}{keys}"));
        if let Some(reactions) = self.key_reactions.get_mut(&node) {
            for reaction in reactions.iter_mut() {
                reaction(&mut self.dom, keys);
            }
        }
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        self.call_history
            .push(format!("sleep:{}ms", duration.as_millis()));
        self.sleeps.push(duration);
        for reaction in &mut self.sleep_reactions {
            reaction(&mut self.dom);
        }
    }
}
