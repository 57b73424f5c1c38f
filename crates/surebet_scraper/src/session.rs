//! One browser session per scrape: optional login, navigation, scrolling, extraction.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::extract::Extractor;
use crate::model::{LoginOutcome, ScrapeRequest, SurebetMap};

pub const EMAIL_SELECTORS: &[&str] = &[
    r#"input[type="email"]"#,
    r#"input[name="email"]"#,
    r#"input[name="login"]"#,
    r#"input[id*="email"]"#,
];

pub const PASSWORD_SELECTORS: &[&str] = &[
    r#"input[type="password"]"#,
    r#"input[name="password"]"#,
    r#"input[id*="password"]"#,
];

pub const BROWSER_LOCALE: &str = "fr-FR";

/// Flags required on constrained hosts (containers, PaaS dynos).
pub const CHROME_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
];

const SELECTOR_WAIT: Duration = Duration::from_secs(3);
const LOGIN_SETTLE: Duration = Duration::from_secs(2);
const SCROLL_STEPS: usize = 4;
const SCROLL_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub headless: bool,
    pub locale: String,
    pub args: Vec<String>,
    /// Upper bound for a single navigation.
    pub navigation_timeout: Duration,
}

impl From<&ScrapeRequest> for LaunchConfig {
    fn from(req: &ScrapeRequest) -> Self {
        Self {
            headless: req.headless,
            locale: BROWSER_LOCALE.to_string(),
            args: CHROME_ARGS.iter().map(|a| a.to_string()).collect(),
            navigation_timeout: req.navigation_timeout(),
        }
    }
}

/// Browser automation primitives used by a scrape.
///
/// Implementations own their browser process; dropping the page releases it.
pub trait PageDriver {
    /// Navigate and wait until the document has loaded, bounded by `timeout`.
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    /// True when an element matching `selector` shows up within `timeout`.
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> bool;
    fn fill(&self, selector: &str, value: &str) -> Result<()>;
    fn press_enter(&self, selector: &str) -> Result<()>;
    /// Scroll down by one viewport height.
    fn scroll_viewport(&self) -> Result<()>;
    fn pause(&self, duration: Duration);
    /// Serialized live DOM.
    fn content(&self) -> Result<String>;
}

pub trait BrowserEngine: Send + Sync {
    fn open(&self, config: &LaunchConfig) -> Result<Box<dyn PageDriver>>;
}

/// Best-effort login; never fails the caller.
pub fn try_login(page: &dyn PageDriver, req: &ScrapeRequest) -> LoginOutcome {
    let Some((email, password)) = req.credentials() else {
        return LoginOutcome::NotAttempted;
    };

    match submit_login_form(page, req, email, password) {
        Ok(true) => {
            info!("Login form submitted (outcome not verified)");
            LoginOutcome::Submitted
        }
        Ok(false) => {
            warn!("Login form not found on {}", req.login_target());
            LoginOutcome::Failed
        }
        Err(e) => {
            warn!("Login attempt failed: {:#}", e);
            LoginOutcome::Failed
        }
    }
}

fn submit_login_form(
    page: &dyn PageDriver,
    req: &ScrapeRequest,
    email: &str,
    password: &str,
) -> Result<bool> {
    page.navigate(req.login_target(), req.navigation_timeout())
        .context("login page navigation")?;

    for sel in EMAIL_SELECTORS {
        if page.wait_for_selector(sel, SELECTOR_WAIT) {
            page.fill(sel, email).context("fill email")?;
            debug!("email filled via {}", sel);
            break;
        }
    }

    let mut submitted = false;
    for sel in PASSWORD_SELECTORS {
        if page.wait_for_selector(sel, SELECTOR_WAIT) {
            page.fill(sel, password).context("fill password")?;
            page.press_enter(sel).context("submit password")?;
            debug!("password submitted via {}", sel);
            submitted = true;
            break;
        }
    }

    page.pause(LOGIN_SETTLE);
    Ok(submitted)
}

/// Runs the full page protocol and returns the extracted surebets.
pub fn run_session(
    page: &dyn PageDriver,
    extractor: &Extractor,
    req: &ScrapeRequest,
) -> Result<(SurebetMap, LoginOutcome)> {
    let login = try_login(page, req);

    page.navigate(&req.base_url, req.navigation_timeout())
        .with_context(|| format!("navigation to {} failed", req.base_url))?;

    for _ in 0..SCROLL_STEPS {
        page.scroll_viewport().context("scroll")?;
        page.pause(SCROLL_PAUSE);
    }

    let html = page.content().context("Failed to read DOM from browser tab")?;
    let data = extractor.extract(&html);
    debug!(surebets = data.len(), html_len = html.len(), "DOM extracted");

    Ok((data, login))
}
