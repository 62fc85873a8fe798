//! probar-select2: drive select2 searchable dropdowns from Rust browser tests
//!
//! select2 replaces a `<select>` with its own markup, so a test cannot simply
//! pick an option. This crate opens the widget, optionally types a search,
//! waits out result loading, finds the option matching a value, and clicks
//! it. Markup of select2 3.x and 4.x is told apart by feature detection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  PROBAR-SELECT2 Architecture                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ select2::  │    │ Session    │    │ PageDriver │            │
//! │   │ select /   │───►│ (auto-wait,│───►│ Chromium / │            │
//! │   │ filter     │    │  retries)  │    │ MockPage   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use probar_select2::{select2, Select2Options, Session};
//!
//! let mut session = Session::new(page);
//! select2::select(&mut session, "Apple", &Select2Options::new().with_label("Fruit"))?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod config;
mod driver;
#[allow(clippy::missing_const_for_fn, clippy::doc_markdown)]
mod locator;
mod result;
#[allow(clippy::missing_errors_doc)]
mod session;
mod wait;

/// Tracing subscriber setup for test binaries
pub mod logging;

/// In-memory page for testing widget interactions without a browser
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;

/// The select2 interaction routine
#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
pub mod select2;

/// Real browser control via CDP
#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::significant_drop_tightening,
    clippy::needless_raw_string_hashes
)]
pub mod browser;

pub use assertion::{AssertionCheckResult, RetryAssertion, RetryConfig, RetryResult};
pub use config::{Select2Config, DEFAULT_LOADING_SELECTOR, DEFAULT_PLACEHOLDER_TEXTS};
pub use driver::{ElementHandle, PageDriver};
pub use locator::{
    css_string, normalize_text, LocatorOptions, Query, Selector, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_MS,
};
pub use result::{Select2Error, Select2Result};
pub use select2::{
    filter, select, select_each, ContainerLocator, DropContainer, MatchMode, OptionElement,
    OptionMatcher, Select2Options, TriggerVariant,
};
pub use session::Session;
pub use wait::{
    ExhaustionPolicy, PollOutcome, RetryBudget, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_INTERVAL_MS,
};

#[cfg(feature = "browser")]
pub use browser::{BrowserConfig, ChromiumPage};
