//! Chrome engine přes headless_chrome (blocking API, volat ze spawn_blocking).

use anyhow::{anyhow, Context, Result};
use headless_chrome::util::Wait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::session::{BrowserEngine, LaunchConfig, PageDriver};

const WINDOW_SIZE: (u32, u32) = (1366, 900);

#[derive(Debug, Clone, Default)]
pub struct ChromeEngine {
    /// Explicit executable; autodetected when `None`.
    chrome_path: Option<PathBuf>,
}

impl ChromeEngine {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

const MIN_IDLE: Duration = Duration::from_secs(60);
const MAX_IDLE: Duration = Duration::from_secs(6 * 60 * 60);
const DOM_POLL: Duration = Duration::from_millis(100);

/// Set on the old document before navigating; gone once the new one is committed.
const NAV_MARKER: &str = "window.__surebetPrevDocument = true";
const DOM_READY: &str =
    "window.__surebetPrevDocument !== true && document.readyState !== 'loading'";

/// Chrome exits on its own after this long without CDP traffic.
fn idle_timeout(navigation: Duration) -> Duration {
    navigation.saturating_mul(2).clamp(MIN_IDLE, MAX_IDLE)
}

fn accept_language(locale: &str) -> String {
    match locale.split('-').next() {
        Some(lang) if lang != locale => format!("{locale},{lang};q=0.9"),
        _ => locale.to_string(),
    }
}

impl BrowserEngine for ChromeEngine {
    fn open(&self, config: &LaunchConfig) -> Result<Box<dyn PageDriver>> {
        let lang_flag = format!("--lang={}", config.locale);
        let args: Vec<&OsStr> = config
            .args
            .iter()
            .map(|a| OsStr::new(a.as_str()))
            .chain(std::iter::once(OsStr::new(lang_flag.as_str())))
            .collect();

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .path(self.chrome_path.clone())
            .window_size(Some(WINDOW_SIZE))
            .idle_browser_timeout(idle_timeout(config.navigation_timeout))
            .args(args)
            .build()
            .context("Failed to build Chrome launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        let tab = browser
            .new_context()
            .context("Failed to create browser context")?
            .new_tab()
            .context("Failed to create browser tab")?;

        let language = accept_language(&config.locale);
        if let Err(e) = tab.set_extra_http_headers(HashMap::from([("Accept-Language", language.as_str())])) {
            warn!("Cannot set Accept-Language {}: {}", language, e);
        }

        debug!(headless = config.headless, "Chrome session opened");
        Ok(Box::new(ChromePage { tab, _browser: browser }))
    }
}

/// Tab plus the browser process that owns it. Dropping closes both.
pub struct ChromePage {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl PageDriver for ChromePage {
    /// Returns once the new document is parsed (DOMContentLoaded), not when the network idles.
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.tab.evaluate(NAV_MARKER, false).context("mark current document")?;
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Chrome navigate to {url} failed"))?;

        Wait::new(timeout, DOM_POLL)
            .until(|| {
                // evaluate errors while the old context is torn down mean "not yet"
                let ready = self.tab.evaluate(DOM_READY, false).ok()?.value?;
                ready.as_bool().filter(|r| *r)
            })
            .map_err(|e| anyhow!("{url} not loaded within {}s: {e}", timeout.as_secs()))?;
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool {
        match self.tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => true,
            Err(e) => {
                debug!("selector {} not found: {}", selector, e);
                false
            }
        }
    }

    fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self.tab.find_element(selector)?;
        element.call_js_fn("function() { this.focus(); this.value = ''; }", vec![], false)?;
        element.type_into(value)?;
        Ok(())
    }

    fn press_enter(&self, selector: &str) -> Result<()> {
        self.tab.find_element(selector)?.focus()?;
        self.tab.press_key("Enter")?;
        Ok(())
    }

    fn scroll_viewport(&self) -> Result<()> {
        self.tab.evaluate("window.scrollBy(0, window.innerHeight)", false)?;
        Ok(())
    }

    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content()
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        // browser process is killed when `self._browser` drops
        if let Err(e) = self.tab.close(false) {
            debug!("Chrome tab close failed: {}", e);
        }
    }
}
