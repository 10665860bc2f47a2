// In crates/core-types/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// A ticker symbol, normalized to uppercase at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The direction of a simulated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// A single observed price, recorded once per successful poll.
///
/// `time` is the local wall-clock time of the observation, second
/// resolution, preformatted as `HH:MM:SS` (the wire format the dashboard
/// chart axis consumes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub time: String,
    pub price: f64,
}

/// A simulated trade recorded when the threshold rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub time: String,
    pub action: TradeAction,
    pub price: f64,
}
