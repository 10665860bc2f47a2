// In crates/quote-client/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("Malformed provider response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("Provider error: {code}: {description}")]
    Provider { code: String, description: String },
    #[error("No data returned for {symbol}")]
    NoData { symbol: String },
}

pub type Result<T> = std::result::Result<T, Error>;
