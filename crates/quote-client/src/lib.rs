// In crates/quote-client/src/lib.rs

use app_config::QuoteSettings;
use async_trait::async_trait;
use chrono::{Local, LocalResult, TimeZone};
use core_types::{PriceSample, Symbol};
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

/// Read access to the external quote provider.
///
/// The strategy engine and the HTTP handlers depend on this trait rather
/// than on `QuoteClient` directly, so tests can inject a scripted source.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// The most recent closing price of the one-day series, unrounded.
    async fn latest_price(&self, symbol: &Symbol) -> Result<f64>;

    /// The provider's price series over `range` at `interval`, for charting.
    async fn price_series(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceSample>>;
}

/// HTTP client for a Yahoo-Finance-style chart API.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl QuoteClient {
    /// Constructs a new QuoteClient from QuoteSettings.
    ///
    /// The request timeout bounds every lookup, including the ones issued
    /// from inside the polling loop.
    pub fn new(settings: &QuoteSettings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(Error::RequestFailed)?;

        Ok(QuoteClient {
            http_client,
            base_url: settings.base_url.clone(),
        })
    }

    /// Fetches the chart series for a symbol.
    ///
    /// This corresponds to the `GET /v8/finance/chart/{symbol}` endpoint.
    async fn fetch_series(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceSample>> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, symbol, range, interval
        );
        tracing::debug!(symbol = %symbol, range, interval, "Requesting chart data.");

        let response_body = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Error::RequestFailed)?
            .text()
            .await
            .map_err(Error::RequestFailed)?;

        let parsed: ChartResponse =
            serde_json::from_str(&response_body).map_err(Error::MalformedResponse)?;

        series_from_response(parsed, symbol)
    }
}

#[async_trait]
impl QuoteSource for QuoteClient {
    async fn latest_price(&self, symbol: &Symbol) -> Result<f64> {
        let series = self.fetch_series(symbol, "1d", "1m").await?;
        series
            .last()
            .map(|sample| sample.price)
            .ok_or_else(|| Error::NoData {
                symbol: symbol.to_string(),
            })
    }

    async fn price_series(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<Vec<PriceSample>> {
        self.fetch_series(symbol, range, interval).await
    }
}

/// Extracts the usable `{time, price}` points from a parsed chart response.
///
/// The provider reports symbol-level failures inside the envelope rather
/// than via the HTTP status, so the error object is checked first. Closes
/// that arrive as `null` are skipped; an all-null or absent series is
/// reported as `NoData`.
fn series_from_response(parsed: ChartResponse, symbol: &Symbol) -> Result<Vec<PriceSample>> {
    let envelope = parsed.chart;

    if let Some(err) = envelope.error {
        return Err(Error::Provider {
            code: err.code,
            description: err.description,
        });
    }

    let result = envelope
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| Error::NoData {
            symbol: symbol.to_string(),
        })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let samples: Vec<PriceSample> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            close.map(|price| PriceSample {
                time: format_time(*ts),
                price,
            })
        })
        .collect();

    if samples.is_empty() {
        return Err(Error::NoData {
            symbol: symbol.to_string(),
        });
    }

    Ok(samples)
}

/// Formats a unix timestamp as local wall-clock `HH:MM:SS`.
fn format_time(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0) {
        LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => ts.to_string(),
    }
}

/// Rounds a price to 2 decimal places for display. Strategy math always
/// uses the unrounded value.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
