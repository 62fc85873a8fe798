//! Driving select2 searchable dropdowns.
//!
//! One interaction runs these steps in order:
//!
//! ```text
//! locate container ─► open trigger ─► [type search + wait loading]
//!        ─► resolve drop container ─► [settle sleep] ─► [await option]
//!        ─► fetch options ─► match ─► click (select) / return (filter)
//! ```
//!
//! Markup of select2 3.x and 4.x is told apart by feature detection at each
//! step, so the same call works against either version.

mod container;
mod matcher;
mod opener;
mod options;
mod results;

pub use container::{locate_container, ContainerLocator, CONTAINER_CLASS};
pub use matcher::{OptionElement, OptionMatcher};
pub use opener::{open, TriggerVariant};
pub use options::{MatchMode, Select2Options};
pub use results::{
    await_option, collect_options, fetch_options, search, ContainerMarkup, DropContainer,
    ItemMarkup, SEARCH_FIELD,
};

use crate::driver::PageDriver;
use crate::result::Select2Result;
use crate::session::Session;
use crate::wait::RetryBudget;
use tracing::{debug, info};

/// An opened widget, ready for its options to be read
#[derive(Debug, Clone, Copy)]
struct Opened {
    drop: DropContainer,
    budget: RetryBudget,
}

/// Locate, open, optionally search, and resolve the drop container.
///
/// Options are validated before the page is touched.
fn open_widget<D: PageDriver>(
    session: &mut Session<D>,
    value: &str,
    options: &Select2Options,
) -> Select2Result<Opened> {
    let locator = ContainerLocator::from_options(options)?;
    let budget = options.retry_budget(session.config())?;
    let settle = options.settle_delay()?;

    let container = locator.locate(session)?;
    open(session, &container)?;
    if options.search {
        search(session, value, &budget)?;
    }
    let drop = DropContainer::resolve(session, options.search)?;
    if let Some(delay) = settle {
        debug!(?delay, "settling before reading options");
        session.sleep(delay);
    }
    Ok(Opened { drop, budget })
}

/// Select the single option matching `value` and click it.
///
/// Returns the option that was clicked.
///
/// # Errors
///
/// - [`crate::Select2Error::Configuration`] for invalid options, before any
///   page interaction
/// - [`crate::Select2Error::ElementNotFound`] if the widget, its trigger, or
///   a matching option is missing
/// - [`crate::Select2Error::Ambiguous`] if several widgets or options match
/// - [`crate::Select2Error::LoadingTimeout`] with `strict_loading` when
///   loading never clears
pub fn select<D: PageDriver>(
    session: &mut Session<D>,
    value: &str,
    options: &Select2Options,
) -> Select2Result<OptionElement> {
    let matcher = OptionMatcher::new(value, options.match_mode)?;
    let Opened { drop, budget } = open_widget(session, value, options)?;
    if options.await_option {
        await_option(session, &drop, &matcher, options.expected_matches())?;
    }
    let rendered = fetch_options(session, &drop, &budget)?;
    let chosen = matcher.resolve(rendered)?;
    session.click(&chosen.handle)?;
    info!(
        value = matcher.value(),
        mode = %matcher.mode(),
        option = %chosen.text,
        "selected select2 option"
    );
    Ok(chosen)
}

/// Open the widget and return every option matching `value`, in order.
///
/// Zero or several matches are not errors here.
pub fn filter<D: PageDriver>(
    session: &mut Session<D>,
    value: &str,
    options: &Select2Options,
) -> Select2Result<Vec<OptionElement>> {
    let matcher = OptionMatcher::new(value, options.match_mode)?;
    let Opened { drop, budget } = open_widget(session, value, options)?;
    let matched = matcher.filter(fetch_options(session, &drop, &budget)?);
    debug!(value = matcher.value(), count = matched.len(), "filtered select2 options");
    Ok(matched)
}

/// Select several values in turn (multi-select widgets), reopening the
/// widget for each. Stops at the first failure.
pub fn select_each<D, V>(
    session: &mut Session<D>,
    values: &[V],
    options: &Select2Options,
) -> Select2Result<Vec<OptionElement>>
where
    D: PageDriver,
    V: AsRef<str>,
{
    // Reject bad addressing before the page is touched, even for an empty list.
    let _locator = ContainerLocator::from_options(options)?;
    values
        .iter()
        .map(|value| select(session, value.as_ref(), options))
        .collect()
}
