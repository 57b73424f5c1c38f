//! HTTP façade: GET /, /ping, /last; POST /scrape.

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use surebet_scraper::{ScrapeRequest, ScrapeResult, SurebetScraper};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::LastResultStore;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No result available yet")]
    NotFound,
    #[error("Invalid scrape request: {0}")]
    InvalidRequest(#[from] serde_json::Error),
    #[error("Scrape failed: {0:#}")]
    Scrape(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Scrape(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Scrape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub scraper: Arc<SurebetScraper>,
    pub store: LastResultStore,
}

impl AppState {
    pub fn new(scraper: SurebetScraper) -> Self {
        Self::with_store(scraper, LastResultStore::new())
    }

    pub fn with_store(scraper: SurebetScraper, store: LastResultStore) -> Self {
        Self { scraper: Arc::new(scraper), store }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(ping))
        .route("/last", get(last))
        .route("/scrape", post(scrape))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Surebet Scraper API" }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "pong": true }))
}

async fn last(State(state): State<AppState>) -> Result<Json<ScrapeResult>, ApiError> {
    state.store.get().await.map(Json).ok_or(ApiError::NotFound)
}

/// Runs one scrape synchronously; the response arrives once the browser session has finished.
/// Scrape and publish run in their own task, so a client that hangs up early still leaves the
/// result in `/last`.
async fn scrape(State(state): State<AppState>, body: Bytes) -> Result<Json<ScrapeResult>, ApiError> {
    let req = parse_request(&body)?;
    let scraper = Arc::clone(&state.scraper);
    let store = state.store.clone();

    let job = tokio::spawn(async move {
        let result = scraper.scrape(req).await?;
        if store.publish(result.clone()).await {
            debug!("last result replaced ({} surebets)", result.data.len());
        } else {
            info!("A newer scrape already completed; keeping it as last result");
        }
        Ok::<_, anyhow::Error>(result)
    });

    let result = job.await.context("scrape task aborted")??;
    Ok(Json(result))
}

/// Empty body means "all defaults".
pub fn parse_request(body: &[u8]) -> Result<ScrapeRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ScrapeRequest::default());
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_default_request() {
        assert_eq!(parse_request(b"").unwrap(), ScrapeRequest::default());
        assert_eq!(parse_request(b" \n").unwrap(), ScrapeRequest::default());
    }

    #[test]
    fn body_fields_override_defaults() {
        let req = parse_request(br#"{"headless": false, "base_url": "https://example.test/x"}"#).unwrap();
        assert!(!req.headless);
        assert_eq!(req.base_url, "https://example.test/x");
        assert_eq!(req.timeout, 30);
    }

    #[test]
    fn malformed_body_maps_to_422() {
        let err = parse_request(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn error_statuses() {
        assert_eq!(ApiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        let err = ApiError::from(anyhow::anyhow!("Chrome crashed"));
        assert_eq!(err.to_string(), "Scrape failed: Chrome crashed");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
