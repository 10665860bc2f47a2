// In crates/engine/src/task.rs

use crate::StrategyEngine;
use chrono::Local;
use core_types::{PriceSample, TradeAction, TradeEvent};

impl StrategyEngine {
    /// The main, long-running polling loop.
    ///
    /// Runs until the running flag is cleared; the flag is read once per
    /// iteration, before the poll. A lookup failure never terminates the
    /// loop; only an explicit stop does.
    pub(crate) async fn run_loop(self) {
        tracing::info!(
            symbol = %self.settings.symbol,
            interval_secs = self.settings.poll_interval.as_secs(),
            "Strategy loop running."
        );

        loop {
            if !self.is_active() {
                break;
            }
            self.poll_once().await;
            tokio::time::sleep(self.settings.poll_interval).await;
        }

        tracing::info!(symbol = %self.settings.symbol, "Strategy loop stopped.");
    }

    /// Executes a single poll iteration.
    ///
    /// On success: record the sample, evict the oldest past capacity,
    /// compare against the last successfully observed price and append a
    /// trade event on a threshold crossing, then re-anchor. On failure:
    /// log, count, and leave all state untouched, which widens the
    /// comparison window to the next successful poll.
    pub async fn poll_once(&self) {
        match self.source.latest_price(&self.settings.symbol).await {
            Ok(price) => {
                let time = local_timestamp();
                tracing::debug!(symbol = %self.settings.symbol, price, "Checked price.");

                let mut shared = self.shared.lock().unwrap();
                shared.price_history.push_back(PriceSample {
                    time: time.clone(),
                    price,
                });
                if shared.price_history.len() > self.settings.history_size {
                    shared.price_history.pop_front();
                }

                if let Some(last) = shared.last_price {
                    if let Some(action) = decide(last, price, self.settings.threshold) {
                        tracing::info!(
                            symbol = %self.settings.symbol,
                            ?action,
                            price,
                            last_price = last,
                            "Threshold crossed. Recording simulated trade."
                        );
                        shared.trade_log.push(TradeEvent {
                            time,
                            action,
                            price,
                        });
                    }
                }
                shared.last_price = Some(price);
            }
            Err(err) => {
                let poll_errors = {
                    let mut shared = self.shared.lock().unwrap();
                    shared.poll_errors += 1;
                    shared.poll_errors
                };
                tracing::warn!(
                    symbol = %self.settings.symbol,
                    error = %err,
                    poll_errors,
                    "Price poll failed. Keeping previous anchor."
                );
            }
        }
    }
}

/// The threshold decision rule: a pure function of the last successfully
/// observed price and the current one. A drop of at least `threshold`
/// (fractional) triggers a BUY, a rise of at least `threshold` a SELL.
pub fn decide(last: f64, current: f64, threshold: f64) -> Option<TradeAction> {
    let delta = (current - last) / last;
    if delta <= -threshold {
        Some(TradeAction::Buy)
    } else if delta >= threshold {
        Some(TradeAction::Sell)
    } else {
        None
    }
}

/// Local wall-clock time at second resolution, the format both buffers
/// record.
fn local_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
