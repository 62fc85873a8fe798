//! End-to-end select2 interactions against scripted mock pages.

#![allow(clippy::unwrap_used, clippy::panic)]

use probar_select2::logging::{init_logging, LoggingConfig};
use probar_select2::mock::{MockElement, MockPage, NodeId};
use probar_select2::select2::{ContainerMarkup, ItemMarkup, TriggerVariant};
use probar_select2::{
    filter, select, select_each, MatchMode, Select2Config, Select2Error, Select2Options, Session,
};
use std::time::Duration;

/// A labelled select2 widget plus the nodes tests poke at
struct Widget {
    page: MockPage,
    trigger: NodeId,
    search_field: NodeId,
    loading: NodeId,
    options: Vec<NodeId>,
}

impl Widget {
    fn build(
        trigger: TriggerVariant,
        drop: ContainerMarkup,
        item: ItemMarkup,
        texts: &[&str],
    ) -> Self {
        let mut page = MockPage::new();
        let body = page.body();

        let field = page.append(body, MockElement::new("div").class("field"));
        page.append(field, MockElement::new("label").attr("for", "fruit").text("Fruit"));
        page.append(field, MockElement::new("select").id("fruit").hidden());
        let container = page.append(
            field,
            MockElement::new("span").id("s2-fruit").class("select2 select2-container"),
        );
        let trigger_node = page.append(
            container,
            MockElement::new("span").class(trigger.selector().trim_start_matches('.')),
        );

        let drop_node = page.append(
            body,
            MockElement::new("div")
                .class(drop.selector().trim_start_matches('.'))
                .hidden(),
        );
        let search_field = page.append(
            drop_node,
            MockElement::new("input").class("select2-search__field"),
        );
        let list = page.append(drop_node, MockElement::new("ul").class("select2-results"));
        let item_class = item.selector().trim_start_matches("li.");
        let options: Vec<NodeId> = texts
            .iter()
            .map(|text| page.append(list, MockElement::new("li").class(item_class).text(*text)))
            .collect();

        let loading = page.append(
            body,
            MockElement::new("div").class("loading_results").hidden(),
        );

        page.on_click(trigger_node, move |dom| {
            dom.show(drop_node);
            dom.add_class(drop_node, "select2-container--open");
        });
        for option in &options {
            page.on_click(*option, move |dom| {
                dom.hide(drop_node);
                dom.remove_class(drop_node, "select2-container--open");
            });
        }

        Self {
            page,
            trigger: trigger_node,
            search_field,
            loading,
            options,
        }
    }

    /// select2 4.x markup
    fn modern(texts: &[&str]) -> Self {
        Self::build(
            TriggerVariant::Selection,
            ContainerMarkup::Dropdown,
            ItemMarkup::ResultsOption,
            texts,
        )
    }
}

fn session(page: MockPage) -> Session<MockPage> {
    let _ = init_logging(&LoggingConfig::default().with_level("probar_select2=debug"));
    Session::with_config(
        page,
        Select2Config::new().with_wait_timeout(Duration::from_millis(200)),
    )
}

fn by_css() -> Select2Options {
    Select2Options::new().with_css("#s2-fruit")
}

fn texts(options: &[probar_select2::OptionElement]) -> Vec<&str> {
    options.iter().map(|o| o.text.as_str()).collect()
}

mod addressing {
    use super::*;

    #[test]
    fn every_mode_selects_in_the_same_widget() {
        let modes = [
            Select2Options::new().with_xpath("//span[@id='s2-fruit']"),
            Select2Options::new().with_css("#s2-fruit"),
            Select2Options::new().with_field_id("fruit"),
            Select2Options::new().with_label("Fruit"),
        ];
        for options in modes {
            let widget = Widget::modern(&["Apple", "Banana"]);
            let mut session = session(widget.page);
            let chosen = select(&mut session, "Banana", &options).unwrap();
            assert_eq!(chosen.position, 1);
            assert!(session.driver().was_clicked(widget.trigger), "{options:?}");
            assert!(session.driver().was_clicked(widget.options[1]), "{options:?}");
        }
    }

    #[test]
    fn no_mode_fails_before_touching_the_page() {
        let widget = Widget::modern(&["Apple"]);
        let mut session = session(widget.page);
        let err = select(&mut session, "Apple", &Select2Options::new()).unwrap_err();
        assert!(err.is_configuration());
        assert!(session.driver().history().is_empty());

        let err = filter(&mut session, "Apple", &Select2Options::new()).unwrap_err();
        assert!(err.is_configuration());
        assert!(session.driver().history().is_empty());
    }

    #[test]
    fn two_modes_are_rejected() {
        let widget = Widget::modern(&["Apple"]);
        let mut session = session(widget.page);
        let options = by_css().with_label("Fruit");
        assert!(select(&mut session, "Apple", &options).unwrap_err().is_configuration());
        assert!(session.driver().history().is_empty());
    }

    #[test]
    fn unknown_label_is_not_found() {
        let widget = Widget::modern(&["Apple"]);
        let mut session = session(widget.page);
        let options = Select2Options::new().with_label("Vegetable");
        assert!(select(&mut session, "Apple", &options).unwrap_err().is_not_found());
    }
}

mod markup {
    use super::*;

    #[test]
    fn every_trigger_dropdown_and_item_combination() {
        for trigger in TriggerVariant::DETECTION_ORDER {
            for drop in [ContainerMarkup::Dropdown, ContainerMarkup::Drop] {
                for item in [ItemMarkup::ResultsOption, ItemMarkup::ResultSelectable] {
                    let widget = Widget::build(trigger, drop, item, &["Apple", "Apple Pie"]);
                    let mut session = session(widget.page);
                    let chosen = select(&mut session, "Apple Pie", &by_css())
                        .unwrap_or_else(|e| panic!("{trigger} {drop:?} {item:?}: {e}"));
                    assert_eq!(chosen.position, 1);
                    let driver = session.driver();
                    assert!(driver.was_clicked(widget.trigger));
                    assert!(driver.was_clicked(widget.options[1]));
                    // one trigger click plus one option click
                    assert_eq!(driver.calls_to("click:"), 2);
                }
            }
        }
    }
}

mod matching {
    use super::*;

    #[test]
    fn exact_prefers_identical_text() {
        let widget = Widget::modern(&["Apple", "Apple Pie"]);
        let mut session = session(widget.page);
        select(&mut session, "Apple", &by_css()).unwrap();
        assert!(session.driver().was_clicked(widget.options[0]));
        assert!(!session.driver().was_clicked(widget.options[1]));
    }

    #[test]
    fn contains_ci_reports_ambiguity_with_rendered_count() {
        let widget = Widget::modern(&["apple", "APPLE PIE", "Banana"]);
        let mut session = session(widget.page);
        let options = by_css().with_match_mode(MatchMode::ContainsCi);
        match select(&mut session, "apple", &options) {
            Err(Select2Error::Ambiguous { count, message }) => {
                assert_eq!(count, 3);
                assert_eq!(message, "Ambiguous match, found 3 options for apple");
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
        assert!(!session.driver().was_clicked(widget.options[0]));
    }

    #[test]
    fn contains_cs_is_case_sensitive() {
        let widget = Widget::modern(&["apple", "APPLE PIE"]);
        let mut session = session(widget.page);
        let options = by_css().with_match_mode(MatchMode::ContainsCs);
        let chosen = select(&mut session, "APPLE", &options).unwrap();
        assert_eq!(chosen.text, "APPLE PIE");
    }

    #[test]
    fn zero_matches_names_the_value() {
        let widget = Widget::modern(&["Banana"]);
        let mut session = session(widget.page);
        let err = select(&mut session, "Apple", &by_css()).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Apple"));
    }

    #[test]
    fn filter_returns_matches_in_order() {
        let widget = Widget::modern(&["Apple", "Apple Pie", "Banana"]);
        let mut session = session(widget.page);
        let options = by_css().with_match_mode(MatchMode::ContainsCi);
        let matched = filter(&mut session, "Apple", &options).unwrap();
        assert_eq!(texts(&matched), vec!["Apple", "Apple Pie"]);
        // filtering never clicks an option
        assert_eq!(session.driver().calls_to("click:"), 1);
    }

    #[test]
    fn filter_without_matches_is_empty() {
        let widget = Widget::modern(&["Apple"]);
        let mut session = session(widget.page);
        assert!(filter(&mut session, "Kiwi", &by_css()).unwrap().is_empty());
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let widget = Widget::modern(&["C++ (legacy)", "Cxx legacy"]);
        let mut session = session(widget.page);
        let options = by_css().with_match_mode(MatchMode::ContainsCi);
        let chosen = select(&mut session, "c++ (", &options).unwrap();
        assert_eq!(chosen.position, 0);
    }
}

mod loading {
    use super::*;

    #[test]
    fn search_types_value_and_waits_for_results() {
        let mut widget = Widget::modern(&["Apple", "Banana"]);
        let loading = widget.loading;
        widget
            .page
            .on_keys(widget.search_field, move |dom, _| dom.show(loading));
        let mut ticks = 0;
        widget.page.on_sleep(move |dom| {
            ticks += 1;
            if ticks == 1 {
                dom.hide(loading);
            }
        });
        let mut session = session(widget.page);
        let options = by_css().with_search(true);
        select(&mut session, "Banana", &options).unwrap();
        let driver = session.driver();
        assert!(driver.was_called(&format!("send_keys:node-{}:Banana", widget.search_field)));
        assert!(driver.was_clicked(widget.options[1]));
        assert_eq!(driver.sleep_count(), 1);
    }

    #[test]
    fn loading_that_never_clears_proceeds_to_matching() {
        let mut widget = Widget::modern(&["Apple"]);
        let loading = widget.loading;
        widget
            .page
            .on_keys(widget.search_field, move |dom, _| dom.show(loading));
        let mut session = session(widget.page);
        let options = by_css()
            .with_search(true)
            .with_max_retries(2)
            .with_wait_seconds(0.1);
        select(&mut session, "Apple", &options).unwrap();
        assert_eq!(session.driver().sleep_count(), 2);
        assert_eq!(session.driver().total_slept(), Duration::from_millis(200));
    }

    #[test]
    fn strict_loading_fails_instead() {
        let mut widget = Widget::modern(&["Apple"]);
        let loading = widget.loading;
        widget
            .page
            .on_keys(widget.search_field, move |dom, _| dom.show(loading));
        let mut session = session(widget.page);
        let options = by_css()
            .with_search(true)
            .with_max_retries(2)
            .with_strict_loading(true);
        match select(&mut session, "Apple", &options) {
            Err(Select2Error::LoadingTimeout { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected LoadingTimeout, got {other:?}"),
        }
        assert!(!session.driver().was_clicked(widget.options[0]));
    }

    #[test]
    fn stuck_placeholder_falls_through_to_not_found() {
        let mut widget = Widget::modern(&["Searching…"]);
        widget.page.dom_mut().show(widget.loading);
        let mut session = session(widget.page);
        let options = by_css().with_max_retries(2);
        let err = select(&mut session, "Apple", &options).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(session.driver().sleep_count(), 2);
    }

    #[test]
    fn placeholder_replaced_by_results() {
        let mut widget = Widget::modern(&["Searching..."]);
        let loading = widget.loading;
        let first = widget.options[0];
        widget.page.dom_mut().show(loading);
        widget.page.on_sleep(move |dom| {
            dom.set_text(first, "Apple");
            dom.hide(loading);
        });
        let mut session = session(widget.page);
        let chosen = select(&mut session, "Apple", &by_css()).unwrap();
        assert_eq!(chosen.text, "Apple");
    }

    #[test]
    fn config_file_policy_applies() {
        let config = Select2Config::from_yaml_str(
            "wait_timeout_ms: 200\nmax_retries: 1\nretry_interval_ms: 10\non_exhausted: fail\n",
        )
        .unwrap();
        let mut widget = Widget::modern(&["Apple"]);
        let loading = widget.loading;
        widget
            .page
            .on_keys(widget.search_field, move |dom, _| dom.show(loading));
        let mut session = Session::with_config(widget.page, config);
        let err = select(&mut session, "Apple", &by_css().with_search(true)).unwrap_err();
        assert!(matches!(err, Select2Error::LoadingTimeout { attempts: 2, .. }));
        assert_eq!(session.driver().total_slept(), Duration::from_millis(10));
    }

    #[test]
    fn await_option_absorbs_late_rendering() {
        for await_option in [false, true] {
            let mut widget = Widget::modern(&["Banana", "Apple"]);
            let apple = widget.options[1];
            widget.page.dom_mut().hide(apple);
            let mut ticks = 0;
            widget.page.on_sleep(move |dom| {
                ticks += 1;
                if ticks == 2 {
                    dom.show(apple);
                }
            });
            let mut session = session(widget.page);
            let options = by_css().with_await_option(await_option);
            let result = select(&mut session, "Apple", &options);
            if await_option {
                assert_eq!(result.unwrap().position, 1);
            } else {
                assert!(result.unwrap_err().is_not_found());
            }
        }
    }
}

mod drop_container {
    use super::*;

    fn exact_calls(page: &MockPage, entry: &str) -> usize {
        page.history().iter().filter(|call| *call == entry).count()
    }

    #[test]
    fn detected_once_across_waits_and_retries() {
        let mut widget = Widget::modern(&["Searching...", "Apple"]);
        let placeholder = widget.options[0];
        let apple = widget.options[1];
        let loading = widget.loading;
        widget.page.dom_mut().hide(apple);
        widget.page.dom_mut().show(loading);
        let mut ticks = 0;
        widget.page.on_sleep(move |dom| {
            ticks += 1;
            match ticks {
                2 => dom.show(apple),
                3 => {
                    dom.set_text(placeholder, "Apricot");
                    dom.hide(loading);
                }
                _ => {}
            }
        });

        let mut session = session(widget.page);
        let chosen = select(&mut session, "Apple", &by_css().with_await_option(true)).unwrap();
        assert_eq!(chosen.position, 1);

        let page = session.driver();
        assert!(page.sleep_count() >= 3);
        assert_eq!(exact_calls(page, "query_all:css:.select2-dropdown"), 1);
        assert_eq!(exact_calls(page, "query_all:css:.select2-drop"), 0);
        assert!(exact_calls(page, "query_all:css:.select2-dropdown li.select2-results__option") >= 4);
    }
}

mod multi_select {
    use super::*;

    fn multi(texts: &[&str]) -> Widget {
        Widget::build(
            TriggerVariant::Choices,
            ContainerMarkup::Drop,
            ItemMarkup::ResultSelectable,
            texts,
        )
    }

    #[test]
    fn select_each_reopens_for_every_value() {
        let widget = multi(&["Apple", "Banana", "Cherry"]);
        let mut session = session(widget.page);
        let chosen = select_each(&mut session, &["Apple", "Cherry"], &by_css()).unwrap();
        assert_eq!(texts(&chosen), vec!["Apple", "Cherry"]);
        let driver = session.driver();
        assert_eq!(driver.calls_to(&format!("click:node-{}", widget.trigger)), 2);
        assert!(driver.was_clicked(widget.options[0]));
        assert!(driver.was_clicked(widget.options[2]));
    }

    #[test]
    fn select_each_stops_at_first_failure() {
        let widget = multi(&["Apple", "Banana"]);
        let mut session = session(widget.page);
        let values = vec!["Apple".to_string(), "Durian".to_string(), "Banana".to_string()];
        let err = select_each(&mut session, &values, &by_css()).unwrap_err();
        assert!(err.to_string().contains("Durian"));
        assert!(session.driver().was_clicked(widget.options[0]));
        assert!(!session.driver().was_clicked(widget.options[1]));
    }
}
