//! Chromium page driver (requires the `browser` feature).
//!
//! [`ChromiumPage`] drives a real tab over CDP with chromiumoxide. CDP is
//! async, so the page owns a private tokio runtime and blocks on it, keeping
//! [`PageDriver`] synchronous.
//!
//! Element handles live in a registry on the page (`window.__probarSelect2`).
//! Every primitive is a small script evaluated in the tab; navigation clears
//! the registry, which makes old handles stale.

use crate::driver::{ElementHandle, PageDriver};
use crate::locator::Query;
use crate::result::{Select2Error, Select2Result};
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a window
    pub headless: bool,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// A Chromium tab implementing [`PageDriver`]
#[derive(Debug)]
pub struct ChromiumPage {
    runtime: Runtime,
    browser: CdpBrowser,
    page: CdpPage,
    handler: JoinHandle<()>,
}

impl ChromiumPage {
    /// Launch Chromium and open a blank tab
    pub fn launch(config: &BrowserConfig) -> Select2Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let (browser, page, handler) = runtime.block_on(async {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(Select2Error::driver)?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| Select2Error::driver(e.to_string()))?;
            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| Select2Error::driver(e.to_string()))?;
            Ok::<_, Select2Error>((browser, page, handler))
        })?;

        debug!(headless = config.headless, "launched chromium");
        Ok(Self {
            runtime,
            browser,
            page,
            handler,
        })
    }

    /// Navigate to a URL and wait for it to load
    pub fn goto(&mut self, url: &str) -> Select2Result<()> {
        let page = &self.page;
        self.runtime.block_on(async {
            page.goto(url)
                .await
                .map_err(|e| Select2Error::driver(format!("navigation to {url} failed: {e}")))?;
            Ok::<_, Select2Error>(())
        })?;
        debug!(url, "navigated");
        Ok(())
    }

    /// Close the browser
    pub fn close(mut self) -> Select2Result<()> {
        let browser = &mut self.browser;
        self.runtime.block_on(async {
            browser
                .close()
                .await
                .map_err(|e| Select2Error::driver(e.to_string()))
        })?;
        self.handler.abort();
        Ok(())
    }

    fn evaluate<T: DeserializeOwned>(&self, script: String) -> Select2Result<T> {
        trace!(%script, "evaluating");
        let page = &self.page;
        self.runtime.block_on(async {
            let result = page
                .evaluate(script)
                .await
                .map_err(|e| Select2Error::driver(e.to_string()))?;
            result
                .into_value()
                .map_err(|e| Select2Error::driver(e.to_string()))
        })
    }
}

const REGISTRY: &str = "const reg = window.__probarSelect2 || \
    (window.__probarSelect2 = { next: 0, nodes: new Map() });";

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn element_lookup(handle: &ElementHandle) -> String {
    format!(
        "const el = reg.nodes.get({id}); \
         if (!el || !el.isConnected) throw new Error('stale element handle ' + {id});",
        id = js_string(&handle.id)
    )
}

/// Wraps `body` in an arrow function that declares the registry once.
fn wrap_script(body: &str) -> String {
    format!("(() => {{ {REGISTRY} {body} }})()")
}

fn query_script(scope: Option<&ElementHandle>, query: Query<'_>) -> String {
    let scope = scope.map_or_else(
        || "const root = document;".to_string(),
        |handle| format!("{} const root = el;", element_lookup(handle)),
    );
    let collect = match query {
        Query::Css(css) => format!("const found = Array.from(root.querySelectorAll({}));", js_string(css)),
        Query::XPath(xpath) => format!(
            "const snap = document.evaluate({}, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
             const found = []; \
             for (let i = 0; i < snap.snapshotLength; i++) found.push(snap.snapshotItem(i));",
            js_string(xpath)
        ),
    };
    wrap_script(&format!(
        "{scope} {collect} \
         const visible = n => n.nodeType === 1 && \
           !!(n.offsetWidth || n.offsetHeight || n.getClientRects().length); \
         return found.filter(visible).map(n => {{ \
           if (n.__probarSelect2Id === undefined) {{ \
             n.__probarSelect2Id = 'h' + (reg.next++); reg.nodes.set(n.__probarSelect2Id, n); \
           }} \
           return {{ id: n.__probarSelect2Id, tag_name: n.tagName.toLowerCase() }}; \
         }});"
    ))
}

fn click_script(handle: &ElementHandle) -> String {
    wrap_script(&format!(
        "{} \
         for (const type of ['mousedown', 'mouseup', 'click']) {{ \
           el.dispatchEvent(new MouseEvent(type, {{ bubbles: true, cancelable: true, view: window }})); \
         }} \
         return true;",
        element_lookup(handle)
    ))
}

fn send_keys_script(handle: &ElementHandle, keys: &str) -> String {
    wrap_script(&format!(
        "{} \
         el.focus(); el.value = (el.value || '') + {keys}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new KeyboardEvent('keyup', {{ bubbles: true }})); \
         return true;",
        element_lookup(handle),
        keys = js_string(keys)
    ))
}

fn text_script(handle: &ElementHandle) -> String {
    wrap_script(&format!(
        "{} return el.innerText || el.textContent || '';",
        element_lookup(handle)
    ))
}

impl PageDriver for ChromiumPage {
    fn query_all(
        &mut self,
        scope: Option<&ElementHandle>,
        query: Query<'_>,
    ) -> Select2Result<Vec<ElementHandle>> {
        self.evaluate(query_script(scope, query))
    }

    fn text(&mut self, element: &ElementHandle) -> Select2Result<String> {
        self.evaluate(text_script(element))
    }

    fn click(&mut self, element: &ElementHandle) -> Select2Result<()> {
        self.evaluate::<bool>(click_script(element)).map(|_| ())
    }

    fn send_keys(&mut self, element: &ElementHandle, keys: &str) -> Select2Result<()> {
        self.evaluate::<bool>(send_keys_script(element, keys))
            .map(|_| ())
    }

    fn sleep(&mut self, duration: Duration) {
        self.runtime.block_on(tokio::time::sleep(duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BrowserConfig::default()
            .with_viewport(1024, 768)
            .with_headless(false)
            .with_no_sandbox()
            .with_chromium_path("/usr/bin/chromium");
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.viewport_width, 1024);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_scripts_embed_values_as_js_strings() {
        let handle = ElementHandle::new("h3", "input");
        let script = send_keys_script(&handle, "it's \"quoted\"");
        assert!(script.contains(r#"reg.nodes.get("h3")"#));
        assert!(script.contains(r#"+ "it's \"quoted\"""#));

        let css = query_script(None, Query::Css("label[for=\"fruit\"]"));
        assert!(css.contains(r#"querySelectorAll("label[for=\"fruit\"]")"#));

        let xpath = query_script(Some(&handle), Query::XPath(".."));
        assert!(xpath.contains(r#"document.evaluate("..", root"#));
        assert!(xpath.contains("const root = el;"));
    }

    #[test]
    fn test_each_script_declares_bindings_once() {
        let handle = ElementHandle::new("h7", "span");
        let scripts = [
            query_script(None, Query::Css(".select2-container")),
            query_script(Some(&handle), Query::XPath("..")),
            query_script(Some(&handle), Query::Css(".select2-selection")),
            click_script(&handle),
            send_keys_script(&handle, "app"),
            text_script(&handle),
        ];
        for script in &scripts {
            assert_eq!(script.matches("const reg ").count(), 1, "{script}");
            assert!(script.matches("const el ").count() <= 1, "{script}");
            assert!(script.starts_with("(() => {") && script.ends_with("})()"), "{script}");
        }
        assert_eq!(scripts[1].matches("const el ").count(), 1);
        assert_eq!(scripts[0].matches("const el ").count(), 0);
    }
}
