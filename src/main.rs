/// Surebet Live — API server
///
/// Co dělá:
///   GET  /ping    → {"pong": true}
///   GET  /last    → poslední dokončený scrape (404 dokud žádný není)
///   POST /scrape  → spustí jeden scrape (Chrome), uloží a vrátí výsledek
///
/// Spuštění:
///   cargo run --bin surebet-api
///   curl -X POST localhost:8000/scrape -H 'content-type: application/json' -d '{"headless": true}'

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::EventLogger;
use std::sync::Arc;
use surebet_live::{router, ApiConfig, AppState};
use surebet_scraper::{ChromeEngine, SurebetScraper};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = ApiConfig::from_env()?;

    info!("=== Surebet Live API ===");
    info!("Chrome: {}", config.chrome_path.as_deref().map_or("autodetect".into(), |p| p.display().to_string()));
    info!("Logs: {}", config.log_dir.display());

    let engine = Arc::new(ChromeEngine::new(config.chrome_path.clone()));
    let scraper = SurebetScraper::new(engine)?
        .with_event_log(EventLogger::new(config.log_dir.clone()));
    let app = router(AppState::new(scraper));

    let listener = TcpListener::bind(config.bind).await.context("http bind")?;
    info!("surebet-api listening on http://{} (GET /ping, /last; POST /scrape)", config.bind);

    axum::serve(listener, app).await.context("http server stopped")?;
    Ok(())
}
