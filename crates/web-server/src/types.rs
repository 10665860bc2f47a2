// In crates/web-server/src/types.rs

use serde::{Deserialize, Serialize};

/// Request body for `POST /buy` and `POST /sell`.
///
/// `amount` is echoed back untouched; zero and negative values are
/// accepted, matching the simulated-only contract.
#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub amount: f64,
}

/// Response body for the simulated order endpoints.
#[derive(Debug, Serialize)]
pub struct TradeReceipt {
    pub action: &'static str,
    pub symbol: String,
    pub amount: f64,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub symbol: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub bot: &'static str,
    pub trades: usize,
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub log: Vec<core_types::TradeEvent>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub usd: f64,
    pub btc: f64,
}

/// Query parameters for `GET /price-history/{symbol}`.
#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default = "default_interval")]
    pub interval: String,
}

// Helper functions for serde defaults.
fn default_range() -> String { "1d".to_string() }
fn default_interval() -> String { "1m".to_string() }
