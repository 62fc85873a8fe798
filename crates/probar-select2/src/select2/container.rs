//! Resolving the widget container from the caller's addressing mode.

use super::options::Select2Options;
use crate::driver::{ElementHandle, PageDriver};
use crate::locator::{css_string, Selector};
use crate::result::{Select2Error, Select2Result};
use crate::session::Session;
use std::fmt;
use tracing::debug;

/// Container class of every select2 version
pub const CONTAINER_CLASS: &str = ".select2-container";

/// How the widget container is addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerLocator {
    /// XPath to the container itself
    XPath(String),
    /// CSS selector of the container itself
    Css(String),
    /// `id` of the field a `<label for=...>` points at
    FieldId(String),
    /// Text of a `<label>` sharing a parent with the container
    Label(String),
}

impl ContainerLocator {
    /// Pick the single addressing mode set in `options`.
    ///
    /// # Errors
    ///
    /// [`Select2Error::Configuration`] when none or several are set.
    pub fn from_options(options: &Select2Options) -> Select2Result<Self> {
        let candidates = [
            ("xpath", options.xpath.as_ref().map(|v| Self::XPath(v.clone()))),
            ("css", options.css.as_ref().map(|v| Self::Css(v.clone()))),
            ("field_id", options.field_id.as_ref().map(|v| Self::FieldId(v.clone()))),
            ("label", options.label.as_ref().map(|v| Self::Label(v.clone()))),
        ];
        let mut given: Vec<(&str, Self)> = candidates
            .into_iter()
            .filter_map(|(name, locator)| locator.map(|locator| (name, locator)))
            .collect();

        match given.len() {
            0 => Err(Select2Error::configuration(
                "None of xpath, css, field_id, nor label given",
            )),
            1 => Ok(given.remove(0).1),
            _ => {
                let names: Vec<&str> = given.iter().map(|(name, _)| *name).collect();
                Err(Select2Error::configuration(format!(
                    "Only one of xpath, css, field_id, label may be given (got {})",
                    names.join(", ")
                )))
            }
        }
    }

    /// Find the container on the page
    pub fn locate<D: PageDriver>(&self, session: &mut Session<D>) -> Select2Result<ElementHandle> {
        let container = match self {
            Self::XPath(xpath) => session.find(None, &Selector::xpath(xpath.clone()))?,
            Self::Css(css) => session.find(None, &Selector::css(css.clone()))?,
            Self::FieldId(field_id) => {
                let label = Selector::css(format!("label[for={}]", css_string(field_id)));
                let label = session.find(None, &label)?;
                sibling_container(session, &label)?
            }
            Self::Label(text) => {
                let label = session.find(None, &Selector::css_with_text("label", text.clone()))?;
                sibling_container(session, &label)?
            }
        };
        debug!(locator = %self, container = %container.id, "located select2 container");
        Ok(container)
    }
}

impl fmt::Display for ContainerLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XPath(xpath) => write!(f, "xpath {xpath:?}"),
            Self::Css(css) => write!(f, "css {css:?}"),
            Self::FieldId(id) => write!(f, "field {id:?}"),
            Self::Label(text) => write!(f, "label {text:?}"),
        }
    }
}

fn sibling_container<D: PageDriver>(
    session: &mut Session<D>,
    label: &ElementHandle,
) -> Select2Result<ElementHandle> {
    let parent = session.find(Some(label), &Selector::xpath(".."))?;
    session.find(Some(&parent), &Selector::css(CONTAINER_CLASS))
}

/// Resolve the addressing mode in `options` and find the container
pub fn locate_container<D: PageDriver>(
    session: &mut Session<D>,
    options: &Select2Options,
) -> Select2Result<ElementHandle> {
    ContainerLocator::from_options(options)?.locate(session)
}
