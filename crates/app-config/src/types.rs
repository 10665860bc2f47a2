// In crates/app-config/src/types.rs

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    #[serde(default)]
    pub app: AppSettings,
    /// Settings for the HTTP server.
    #[serde(default)]
    pub server: ServerSettings,
    /// Settings for the external quote provider.
    #[serde(default)]
    pub quote: QuoteSettings,
    /// Settings for the threshold strategy loop.
    #[serde(default)]
    pub strategy: StrategySettings,
    /// The fixed simulated paper balance served by `/balance`.
    #[serde(default)]
    pub paper: PaperSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct QuoteSettings {
    /// The base URL of the chart API.
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,
    /// Per-request timeout. Kept no longer than the poll interval so an
    /// unreachable provider cannot stall a loop iteration indefinitely.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct StrategySettings {
    /// The symbol the strategy loop polls.
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Fractional price-change threshold that triggers a simulated trade.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Capacity of the recent-price ring buffer.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaperSettings {
    #[serde(default = "default_paper_usd")]
    pub usd: f64,
    #[serde(default)]
    pub btc: f64,
}

// Helper functions for serde defaults.
fn default_environment() -> String { "development".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_quote_base_url() -> String { "https://query1.finance.yahoo.com".to_string() }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_symbol() -> String { "BTC-USD".to_string() }
fn default_poll_interval_secs() -> u64 { 10 }
fn default_threshold() -> f64 { 0.02 }
fn default_history_size() -> usize { 100 }
fn default_paper_usd() -> f64 { 10_000.0 }

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_quote_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            poll_interval_secs: default_poll_interval_secs(),
            threshold: default_threshold(),
            history_size: default_history_size(),
        }
    }
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            usd: default_paper_usd(),
            btc: 0.0,
        }
    }
}
