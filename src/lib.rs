/// Surebet Live — HTTP API nad surebet scraperem

pub mod api;
pub mod config;
pub mod store;

pub use api::{router, ApiError, AppState};
pub use config::ApiConfig;
pub use store::LastResultStore;
