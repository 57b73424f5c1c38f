/// Surebet Live — Scraper
///
/// Jeden scrape = jedna browser session:
///   1. launch Chrome (headless dle requestu)
///   2. volitelně best-effort login
///   3. navigace na base_url, 4× scroll pro lazy-load řádky
///   4. extrakce surebet bloků z živého DOM
///   5. browser se zavře vždy, i při chybě

pub mod chrome;
pub mod extract;
pub mod model;
pub mod session;

use anyhow::{Context, Result};
use chrono::Utc;
use logger::{now_iso, EventLogger, ScrapeCompletedEvent, ScrapeFailedEvent};
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{info, warn};

pub use chrome::ChromeEngine;
pub use extract::Extractor;
pub use model::{
    BookmakerRow, GeneralInfo, LoginOutcome, ScrapeMeta, ScrapeRequest, ScrapeResult,
    SurebetGroup, SurebetMap, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
pub use session::{BrowserEngine, LaunchConfig, PageDriver};

pub struct SurebetScraper {
    engine: Arc<dyn BrowserEngine>,
    extractor: Arc<Extractor>,
    events: Option<EventLogger>,
}

impl SurebetScraper {
    pub fn new(engine: Arc<dyn BrowserEngine>) -> Result<Self> {
        Ok(Self {
            engine,
            extractor: Arc::new(Extractor::new()?),
            events: None,
        })
    }

    /// Append scrape summaries to a JSONL event log.
    pub fn with_event_log(mut self, logger: EventLogger) -> Self {
        self.events = Some(logger);
        self
    }

    /// Runs one complete scrape cycle. Blocks a worker thread for the whole browser session.
    pub async fn scrape(&self, req: ScrapeRequest) -> Result<ScrapeResult> {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!(
            base_url = %req.base_url,
            headless = req.headless,
            login = req.credentials().is_some(),
            "Scrape started"
        );

        let engine = Arc::clone(&self.engine);
        let extractor = Arc::clone(&self.extractor);
        let job = req.clone();

        let outcome = task::spawn_blocking(move || -> Result<(SurebetMap, LoginOutcome)> {
            let page = engine
                .open(&LaunchConfig::from(&job))
                .context("Failed to open browser session")?;
            run_page(page, &extractor, &job)
        })
        .await
        .context("Scrape worker aborted")
        .and_then(|r| r);

        let duration_ms = clock.elapsed().as_millis() as u64;

        match outcome {
            Ok((data, login)) => {
                let result = ScrapeResult {
                    scraped_at: Utc::now(),
                    base_url: req.base_url,
                    data,
                    meta: ScrapeMeta { started_at, login },
                };

                info!(
                    surebets = result.data.len(),
                    rows = result.data.bookmaker_rows(),
                    login = %login,
                    duration_ms,
                    "✅ Scrape completed"
                );
                self.record(&ScrapeCompletedEvent {
                    ts: now_iso(),
                    event: "SCRAPE_COMPLETED",
                    base_url: result.base_url.clone(),
                    surebets: result.data.len(),
                    bookmaker_rows: result.data.bookmaker_rows(),
                    login: login.to_string(),
                    duration_ms,
                });
                Ok(result)
            }
            Err(e) => {
                warn!("Scrape of {} failed after {}ms: {:#}", req.base_url, duration_ms, e);
                self.record(&ScrapeFailedEvent {
                    ts: now_iso(),
                    event: "SCRAPE_FAILED",
                    base_url: req.base_url,
                    error: format!("{e:#}"),
                    duration_ms,
                });
                Err(e)
            }
        }
    }

    fn record<T: serde::Serialize>(&self, event: &T) {
        if let Some(events) = &self.events {
            let _ = events.log(event);
        }
    }
}

/// Owns the page for the duration of the session; it is dropped (and the browser closed) on return.
fn run_page(
    page: Box<dyn PageDriver>,
    extractor: &Extractor,
    req: &ScrapeRequest,
) -> Result<(SurebetMap, LoginOutcome)> {
    session::run_session(page.as_ref(), extractor, req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::RecordingPage;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FIXTURE: &str = include_str!("../tests/fixtures/surebets.html");

    struct FixtureEngine {
        opened: AtomicUsize,
        closed: Arc<AtomicUsize>,
        fail_navigation: bool,
    }

    struct TrackedPage {
        inner: RecordingPage,
        closed: Arc<AtomicUsize>,
    }

    impl Drop for TrackedPage {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl PageDriver for TrackedPage {
        fn navigate(&self, url: &str, timeout: std::time::Duration) -> Result<()> {
            self.inner.navigate(url, timeout)
        }
        fn wait_for_selector(&self, selector: &str, timeout: std::time::Duration) -> bool {
            self.inner.wait_for_selector(selector, timeout)
        }
        fn fill(&self, selector: &str, value: &str) -> Result<()> {
            self.inner.fill(selector, value)
        }
        fn press_enter(&self, selector: &str) -> Result<()> {
            self.inner.press_enter(selector)
        }
        fn scroll_viewport(&self) -> Result<()> {
            self.inner.scroll_viewport()
        }
        fn pause(&self, duration: std::time::Duration) {
            self.inner.pause(duration)
        }
        fn content(&self) -> Result<String> {
            self.inner.content()
        }
    }

    impl FixtureEngine {
        fn new(fail_navigation: bool) -> Self {
            Self {
                opened: AtomicUsize::new(0),
                closed: Arc::new(AtomicUsize::new(0)),
                fail_navigation,
            }
        }
    }

    impl BrowserEngine for FixtureEngine {
        fn open(&self, config: &LaunchConfig) -> Result<Box<dyn PageDriver>> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let mut inner = RecordingPage::new(FIXTURE);
            if self.fail_navigation {
                inner.fail_navigation_to = Some(DEFAULT_BASE_URL.to_string());
            }
            assert!(config.headless);
            Ok(Box::new(TrackedPage { inner, closed: Arc::clone(&self.closed) }))
        }
    }

    struct BrokenEngine;

    impl BrowserEngine for BrokenEngine {
        fn open(&self, _config: &LaunchConfig) -> Result<Box<dyn PageDriver>> {
            Err(anyhow!("Chrome binary not found"))
        }
    }

    #[tokio::test]
    async fn scrape_returns_fixture_data_and_releases_browser() {
        let engine = Arc::new(FixtureEngine::new(false));
        let scraper = SurebetScraper::new(engine.clone()).unwrap();

        let result = scraper.scrape(ScrapeRequest::default()).await.unwrap();

        assert_eq!(result.base_url, DEFAULT_BASE_URL);
        assert_eq!(result.data.keys().collect::<Vec<_>>(), vec!["surebet_p1", "surebet_p2"]);
        assert_eq!(result.meta.login, LoginOutcome::NotAttempted);
        assert!(result.meta.started_at <= result.scraped_at);
        assert_eq!(engine.opened.load(Ordering::SeqCst), 1);
        assert_eq!(engine.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn browser_is_released_when_navigation_fails() {
        let engine = Arc::new(FixtureEngine::new(true));
        let scraper = SurebetScraper::new(engine.clone()).unwrap();

        assert!(scraper.scrape(ScrapeRequest::default()).await.is_err());
        assert_eq!(engine.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_scrapes_give_identical_data() {
        let scraper = SurebetScraper::new(Arc::new(FixtureEngine::new(false))).unwrap();

        let first = scraper.scrape(ScrapeRequest::default()).await.unwrap();
        let second = scraper.scrape(ScrapeRequest::default()).await.unwrap();

        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn launch_failure_is_logged_as_event() {
        let dir = std::env::temp_dir().join(format!("surebet-scraper-events-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let events = EventLogger::new(&dir);
        let scraper = SurebetScraper::new(Arc::new(BrokenEngine)).unwrap().with_event_log(events.clone());

        let err = scraper.scrape(ScrapeRequest::default()).await.unwrap_err();
        assert!(format!("{err:#}").contains("Chrome binary not found"));

        let log = std::fs::read_to_string(events.current_file()).unwrap();
        let line: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
        assert_eq!(line["event"], "SCRAPE_FAILED");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
