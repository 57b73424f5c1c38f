use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;

/// Service settings read from the environment (`.env` is loaded by `main`).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    pub log_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `get`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind = match get("SUREBET_API_BIND") {
            Some(addr) => addr.parse().context("Invalid SUREBET_API_BIND")?,
            None => {
                let port = match get("PORT") {
                    Some(p) => p.parse::<u16>().context("Invalid PORT")?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let log_dir = get("SUREBET_LOG_DIR").unwrap_or_else(|| "logs".to_string()).into();
        let chrome_path = get("CHROME_PATH").filter(|p| !p.is_empty()).map(PathBuf::from);

        Ok(Self { bind, log_dir, chrome_path })
    }
}
