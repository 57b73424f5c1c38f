//! Single-slot store for the most recent completed scrape.

use std::sync::Arc;
use surebet_scraper::ScrapeResult;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct LastResultStore {
    slot: Arc<RwLock<Option<ScrapeResult>>>,
}

impl LastResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<ScrapeResult> {
        self.slot.read().await.clone()
    }

    pub async fn is_present(&self) -> bool {
        self.slot.read().await.is_some()
    }

    /// Replaces the slot unless it already holds a result scraped later.
    /// Returns whether `result` was stored.
    pub async fn publish(&self, result: ScrapeResult) -> bool {
        let mut slot = self.slot.write().await;
        if let Some(current) = slot.as_ref() {
            if current.scraped_at > result.scraped_at {
                return false;
            }
        }
        *slot = Some(result);
        true
    }
}
