//! Search typing, loading waits, and reading the rendered options.
//!
//! The drop container is resolved once per call and reused for every later
//! read, since the markup version cannot change mid-interaction.

use super::matcher::{OptionElement, OptionMatcher};
use crate::assertion::{AssertionCheckResult, RetryAssertion, RetryConfig};
use crate::driver::PageDriver;
use crate::locator::Selector;
use crate::result::{Select2Error, Select2Result};
use crate::session::Session;
use crate::wait::RetryBudget;
use std::fmt;
use tracing::{debug, warn};

/// Search box of the currently open widget (page-global)
pub const SEARCH_FIELD: &str = ".select2-container--open input.select2-search__field";

/// Element holding the rendered option list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerMarkup {
    /// `.select2-results`, used after typing a search
    Results,
    /// `.select2-dropdown` (4.x)
    Dropdown,
    /// `.select2-drop` (3.x)
    Drop,
}

impl ContainerMarkup {
    /// CSS selector
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Results => ".select2-results",
            Self::Dropdown => ".select2-dropdown",
            Self::Drop => ".select2-drop",
        }
    }
}

/// Per-option element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemMarkup {
    /// `li.select2-results__option` (4.x)
    ResultsOption,
    /// `li.select2-result-selectable` (3.x)
    ResultSelectable,
}

impl ItemMarkup {
    /// CSS selector
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::ResultsOption => "li.select2-results__option",
            Self::ResultSelectable => "li.select2-result-selectable",
        }
    }
}

/// Drop container and item markup, resolved by feature detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropContainer {
    /// Option list container
    pub container: ContainerMarkup,
    /// Option items inside it
    pub item: ItemMarkup,
}

impl DropContainer {
    /// Detect the markup of the open dropdown.
    ///
    /// After a search the results list is used directly. Otherwise the 4.x
    /// dropdown is waited for, falling back to the 3.x drop. Items are 4.x
    /// options if any render inside the container, else 3.x selectables.
    pub fn resolve<D: PageDriver>(session: &mut Session<D>, searched: bool) -> Select2Result<Self> {
        let container = if searched {
            ContainerMarkup::Results
        } else if session.has_selector(None, &Selector::css(ContainerMarkup::Dropdown.selector()))? {
            ContainerMarkup::Dropdown
        } else {
            ContainerMarkup::Drop
        };
        let modern_items = Selector::css(format!(
            "{} {}",
            container.selector(),
            ItemMarkup::ResultsOption.selector()
        ));
        let item = if session.has_selector(None, &modern_items)? {
            ItemMarkup::ResultsOption
        } else {
            ItemMarkup::ResultSelectable
        };
        let drop = Self { container, item };
        debug!(%drop, "resolved drop container");
        Ok(drop)
    }

    /// Selector of every option item
    #[must_use]
    pub fn item_selector(&self) -> Selector {
        Selector::css(self.to_string())
    }
}

impl fmt::Display for DropContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.container.selector(), self.item.selector())
    }
}

/// Type `value` into the open widget's search box and wait out loading.
///
/// # Errors
///
/// [`Select2Error::LoadingTimeout`] if loading outlives a strict budget.
pub fn search<D: PageDriver>(
    session: &mut Session<D>,
    value: &str,
    budget: &RetryBudget,
) -> Select2Result<()> {
    let field = session.find(None, &Selector::css(SEARCH_FIELD))?;
    session.send_keys(&field, value)?;
    debug!(value, "typed select2 search");

    let loading = Selector::css(session.config().loading_selector.clone());
    let outcome = session.retry_while(budget, |session| session.has_selector_now(None, &loading))?;
    budget.settle(outcome, "loading results")
}

/// Every rendered option, in document order
pub fn collect_options<D: PageDriver>(
    session: &mut Session<D>,
    drop: &DropContainer,
) -> Select2Result<Vec<OptionElement>> {
    let handles = session.find_all(None, &drop.item_selector())?;
    let mut options = Vec::with_capacity(handles.len());
    for (position, handle) in handles.into_iter().enumerate() {
        let text = session.text(&handle)?;
        options.push(OptionElement {
            handle,
            text,
            position,
        });
    }
    Ok(options)
}

/// Read the options, retrying while a placeholder is shown during loading.
///
/// A read is retried only when the loading marker is present and one of the
/// options is a configured placeholder text.
pub fn fetch_options<D: PageDriver>(
    session: &mut Session<D>,
    drop: &DropContainer,
    budget: &RetryBudget,
) -> Select2Result<Vec<OptionElement>> {
    let loading = Selector::css(session.config().loading_selector.clone());
    let mut options = Vec::new();
    let outcome = session.retry_while(budget, |session| {
        options = collect_options(session, drop)?;
        let placeholder = options
            .iter()
            .any(|option| session.config().is_placeholder(&option.text));
        Ok(placeholder && session.has_selector_now(None, &loading)?)
    })?;
    budget.settle(outcome, "placeholder results")?;
    debug!(count = options.len(), attempts = outcome.attempts(), "fetched options");
    Ok(options)
}

/// Wait for the expected number of matching options to render.
///
/// `expected` of `None` waits for at least one. Uses the session's auto-wait
/// timeout. Giving up is logged, not returned: matching then runs against
/// whatever is rendered.
pub fn await_option<D: PageDriver>(
    session: &mut Session<D>,
    drop: &DropContainer,
    matcher: &OptionMatcher,
    expected: Option<usize>,
) -> Select2Result<()> {
    let locator = session.config().locator_options();
    let config = RetryConfig::new(locator.max_attempts(), locator.poll_interval);
    let check = |session: &mut Session<D>| -> Select2Result<AssertionCheckResult> {
        let found = collect_options(session, drop)?
            .iter()
            .filter(|option| matcher.is_match(&option.text))
            .count();
        let satisfied = expected.map_or(found > 0, |count| found == count);
        Ok(if satisfied {
            AssertionCheckResult::Pass
        } else {
            let wanted = expected.map_or_else(|| "at least 1".to_string(), |c| c.to_string());
            AssertionCheckResult::Fail(format!("expected {wanted} matching options, found {found}"))
        })
    };

    let outcome = RetryAssertion::new(check)
        .with_config(config)
        .with_description(format!("{} option {:?}", matcher.mode(), matcher.value()))
        .verify(session);
    match outcome {
        Ok(result) => {
            debug!(attempts = result.attempts, "option rendered");
            Ok(())
        }
        Err(err @ Select2Error::AssertionFailed { .. }) => {
            warn!(%err, "option did not render as expected, matching current results");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Select2Config;
    use crate::mock::{MockElement, MockPage, NodeId};
    use crate::select2::options::MatchMode;
    use crate::wait::ExhaustionPolicy;
    use std::time::Duration;

    fn config() -> Select2Config {
        Select2Config::new().with_wait_timeout(Duration::from_millis(100))
    }

    fn budget(retries: u32) -> RetryBudget {
        RetryBudget::new(retries, Duration::from_millis(10))
    }

    /// Page with an open drop container holding `items`
    fn dropdown(container: &str, item: &str, items: &[&str]) -> (MockPage, Vec<NodeId>) {
        let mut page = MockPage::new();
        let body = page.body();
        let drop = page.append(body, MockElement::new("span").class(container));
        let list = page.append(drop, MockElement::new("ul"));
        let nodes = items
            .iter()
            .map(|text| page.append(list, MockElement::new("li").class(item).text(*text)))
            .collect();
        (page, nodes)
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_every_markup_combination() {
            let cases = [
                ("select2-dropdown", "select2-results__option", false, ContainerMarkup::Dropdown, ItemMarkup::ResultsOption),
                ("select2-dropdown", "select2-result-selectable", false, ContainerMarkup::Dropdown, ItemMarkup::ResultSelectable),
                ("select2-drop", "select2-results__option", false, ContainerMarkup::Drop, ItemMarkup::ResultsOption),
                ("select2-drop", "select2-result-selectable", false, ContainerMarkup::Drop, ItemMarkup::ResultSelectable),
                ("select2-results", "select2-results__option", true, ContainerMarkup::Results, ItemMarkup::ResultsOption),
                ("select2-results", "select2-result-selectable", true, ContainerMarkup::Results, ItemMarkup::ResultSelectable),
            ];
            for (container, item, searched, want_container, want_item) in cases {
                let (page, _) = dropdown(container, item, &["Apple"]);
                let mut session = Session::with_config(page, config());
                let drop = DropContainer::resolve(&mut session, searched).unwrap();
                assert_eq!(drop.container, want_container, "{container} {item}");
                assert_eq!(drop.item, want_item, "{container} {item}");
            }
        }

        #[test]
        fn test_modern_dropdown_detected_without_waiting() {
            let (page, _) = dropdown("select2-dropdown", "select2-results__option", &["Apple"]);
            let mut session = Session::with_config(page, config());
            DropContainer::resolve(&mut session, false).unwrap();
            assert_eq!(session.driver().sleep_count(), 0);
        }

        #[test]
        fn test_item_selector() {
            let drop = DropContainer {
                container: ContainerMarkup::Drop,
                item: ItemMarkup::ResultSelectable,
            };
            assert_eq!(
                drop.item_selector(),
                Selector::css(".select2-drop li.select2-result-selectable")
            );
        }
    }

    mod search_tests {
        use super::*;

        fn searchable() -> (MockPage, NodeId, NodeId) {
            let mut page = MockPage::new();
            let body = page.body();
            let open = page.append(body, MockElement::new("span").class("select2-container select2-container--open"));
            let input = page.append(open, MockElement::new("input").class("select2-search__field"));
            let loading = page.append(body, MockElement::new("div").class("loading_results").hidden());
            (page, input, loading)
        }

        #[test]
        fn test_types_and_waits_for_loading() {
            let (mut page, input, loading) = searchable();
            page.on_keys(input, move |dom, _| dom.show(loading));
            let mut ticks = 0;
            page.on_sleep(move |dom| {
                ticks += 1;
                if ticks == 2 {
                    dom.hide(loading);
                }
            });
            let mut session = Session::with_config(page, config());
            search(&mut session, "App", &budget(5)).unwrap();
            assert!(session.driver().was_called("send_keys:node-3:App"));
            assert_eq!(session.driver().sleep_count(), 2);
        }

        #[test]
        fn test_loading_exhaustion_proceeds() {
            let (mut page, input, loading) = searchable();
            page.on_keys(input, move |dom, _| dom.show(loading));
            let mut session = Session::with_config(page, config());
            search(&mut session, "App", &budget(3)).unwrap();
            assert_eq!(session.driver().sleep_count(), 3);
        }

        #[test]
        fn test_loading_exhaustion_strict() {
            let (mut page, input, loading) = searchable();
            page.on_keys(input, move |dom, _| dom.show(loading));
            let mut session = Session::with_config(page, config());
            let strict = budget(3).with_policy(ExhaustionPolicy::Fail);
            let err = search(&mut session, "App", &strict).unwrap_err();
            assert!(matches!(err, Select2Error::LoadingTimeout { attempts: 4, .. }));
        }
    }

    mod fetch_tests {
        use super::*;

        const DROP: DropContainer = DropContainer {
            container: ContainerMarkup::Dropdown,
            item: ItemMarkup::ResultsOption,
        };

        #[test]
        fn test_reads_options_in_order() {
            let (page, nodes) = dropdown("select2-dropdown", "select2-results__option", &["Apple", " Apple\n Pie ", "Banana"]);
            let mut session = Session::with_config(page, config());
            let options = fetch_options(&mut session, &DROP, &budget(3)).unwrap();
            let texts: Vec<_> = options.iter().map(|o| o.text.as_str()).collect();
            assert_eq!(texts, vec!["Apple", "Apple Pie", "Banana"]);
            assert_eq!(options[2].position, 2);
            assert_eq!(options[0].handle.id, format!("node-{}", nodes[0]));
            assert_eq!(session.driver().sleep_count(), 0);
        }

        #[test]
        fn test_placeholder_retried_until_results_arrive() {
            let (mut page, nodes) = dropdown("select2-dropdown", "select2-results__option", &["Searching…"]);
            let body = page.body();
            let loading = page.append(body, MockElement::new("div").class("loading_results"));
            let placeholder = nodes[0];
            page.on_sleep(move |dom| {
                dom.set_text(placeholder, "Apple");
                dom.hide(loading);
            });
            let mut session = Session::with_config(page, config());
            let options = fetch_options(&mut session, &DROP, &budget(3)).unwrap();
            assert_eq!(options[0].text, "Apple");
            assert_eq!(session.driver().sleep_count(), 1);
        }

        #[test]
        fn test_placeholder_without_loading_marker_is_not_retried() {
            let (page, _) = dropdown("select2-dropdown", "select2-results__option", &["Searching..."]);
            let mut session = Session::with_config(page, config());
            let options = fetch_options(&mut session, &DROP, &budget(3)).unwrap();
            assert_eq!(options.len(), 1);
            assert_eq!(session.driver().sleep_count(), 0);
        }

        #[test]
        fn test_stuck_placeholder_proceeds_or_fails() {
            for policy in [ExhaustionPolicy::Proceed, ExhaustionPolicy::Fail] {
                let (mut page, _) = dropdown("select2-dropdown", "select2-results__option", &["Searching…"]);
                let body = page.body();
                page.append(body, MockElement::new("div").class("loading_results"));
                let mut session = Session::with_config(page, config());
                let result = fetch_options(&mut session, &DROP, &budget(2).with_policy(policy));
                match policy {
                    ExhaustionPolicy::Proceed => assert_eq!(result.unwrap()[0].text, "Searching…"),
                    ExhaustionPolicy::Fail => assert!(matches!(
                        result.unwrap_err(),
                        Select2Error::LoadingTimeout { attempts: 3, .. }
                    )),
                }
                assert_eq!(session.driver().sleep_count(), 2);
            }
        }
    }

    mod await_option_tests {
        use super::*;

        const DROP: DropContainer = DropContainer {
            container: ContainerMarkup::Dropdown,
            item: ItemMarkup::ResultsOption,
        };

        #[test]
        fn test_waits_for_late_option() {
            let (mut page, nodes) = dropdown("select2-dropdown", "select2-results__option", &["Banana", "Apple"]);
            let apple = nodes[1];
            page.dom_mut().hide(apple);
            let mut ticks = 0;
            page.on_sleep(move |dom| {
                ticks += 1;
                if ticks == 3 {
                    dom.show(apple);
                }
            });
            let patient = Select2Config::new().with_wait_timeout(Duration::from_millis(500));
            let mut session = Session::with_config(page, patient);
            let matcher = OptionMatcher::new("Apple", MatchMode::Exact).unwrap();
            await_option(&mut session, &DROP, &matcher, None).unwrap();
            // passes on the 4th of 11 allowed checks
            assert_eq!(session.driver().sleep_count(), 3);
        }

        #[test]
        fn test_gives_up_quietly() {
            let (page, _) = dropdown("select2-dropdown", "select2-results__option", &["Apple", "Apple Pie"]);
            let mut session = Session::with_config(page, config());
            let matcher = OptionMatcher::new("apple", MatchMode::ContainsCi).unwrap();
            await_option(&mut session, &DROP, &matcher, Some(1)).unwrap();
            // 100ms / 50ms polls => 3 checks
            assert_eq!(session.driver().sleep_count(), 2);
        }
    }
}
