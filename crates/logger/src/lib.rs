/// Surebet Live — Logger
/// JSONL event stream, one file per UTC day

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create log dir {:?}: {}", dir, e);
        }
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of today's event file.
    pub fn current_file(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        self.log_dir.join(format!("{date}.jsonl"))
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let path  = self.current_file();
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct ScrapeCompletedEvent {
    pub ts:             String,
    pub event:          &'static str,   // "SCRAPE_COMPLETED"
    pub base_url:       String,
    pub surebets:       usize,
    pub bookmaker_rows: usize,
    pub login:          String,         // "not_attempted" | "submitted" | "failed"
    pub duration_ms:    u64,
}

#[derive(Serialize, Debug)]
pub struct ScrapeFailedEvent {
    pub ts:          String,
    pub event:       &'static str,      // "SCRAPE_FAILED"
    pub base_url:    String,
    pub error:       String,
    pub duration_ms: u64,
}
