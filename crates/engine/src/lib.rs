// In crates/engine/src/lib.rs

pub mod task;

use app_config::StrategySettings;
use core_types::{PriceSample, Symbol, TradeEvent};
use quote_client::QuoteSource;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub use task::decide;

/// Runtime settings for the strategy loop.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub symbol: Symbol,
    pub poll_interval: Duration,
    pub threshold: f64,
    pub history_size: usize,
}

impl From<&StrategySettings> for EngineSettings {
    fn from(settings: &StrategySettings) -> Self {
        Self {
            symbol: Symbol::new(&settings.symbol),
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            threshold: settings.threshold,
            history_size: settings.history_size,
        }
    }
}

/// The result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// A point-in-time snapshot of the engine's lifecycle counters.
#[derive(Debug, Clone, Copy)]
pub struct EngineStatus {
    pub running: bool,
    pub trades: usize,
    pub poll_errors: u64,
}

/// Everything the loop and the HTTP handlers share, behind one lock.
///
/// Keeping the flag, the anchor price, both containers and the task handle
/// under a single mutex makes `start` an atomic check-and-set and keeps
/// log reads consistent with in-flight appends. Critical sections never
/// span an `.await`.
#[derive(Default)]
struct EngineShared {
    active: bool,
    last_price: Option<f64>,
    price_history: VecDeque<PriceSample>,
    trade_log: Vec<TradeEvent>,
    poll_errors: u64,
    task: Option<JoinHandle<()>>,
}

/// The threshold-strategy engine: a single polling loop over one symbol,
/// plus the shared state it maintains.
///
/// Cloning is cheap and every clone operates on the same shared state, so
/// the HTTP layer and the spawned loop each hold their own handle.
#[derive(Clone)]
pub struct StrategyEngine {
    pub(crate) settings: EngineSettings,
    pub(crate) source: Arc<dyn QuoteSource>,
    pub(crate) shared: Arc<Mutex<EngineShared>>,
}

impl StrategyEngine {
    pub fn new(settings: EngineSettings, source: Arc<dyn QuoteSource>) -> Self {
        Self {
            settings,
            source,
            shared: Arc::new(Mutex::new(EngineShared::default())),
        }
    }

    /// Starts the polling loop.
    ///
    /// The check-and-set of the running flag and the spawn happen under
    /// the state lock, so two concurrent starts cannot both spawn.
    pub fn start(&self) -> StartOutcome {
        let mut shared = self.shared.lock().unwrap();
        if shared.active {
            return StartOutcome::AlreadyRunning;
        }
        shared.active = true;

        // A previous loop may still be sleeping out its deferred stop.
        // Abort it so a quick stop/start cycle cannot leave two loops.
        if let Some(old) = shared.task.take() {
            old.abort();
        }

        shared.task = Some(tokio::spawn(self.clone().run_loop()));

        tracing::info!(symbol = %self.settings.symbol, "Strategy loop started.");
        StartOutcome::Started
    }

    /// Requests the loop to stop. Idempotent.
    ///
    /// The loop observes the flag at the top of its next iteration, so an
    /// in-flight poll or sleep is never interrupted and termination can
    /// lag by up to one poll interval.
    pub fn stop(&self) {
        let mut shared = self.shared.lock().unwrap();
        if shared.active {
            tracing::info!(symbol = %self.settings.symbol, "Strategy loop stop requested.");
        }
        shared.active = false;
    }

    /// Stops the loop and aborts its task for process shutdown.
    ///
    /// The loop only notices the flag between iterations; process exit
    /// should not wait out an in-flight sleep.
    pub fn shutdown(&self) {
        let handle = {
            let mut shared = self.shared.lock().unwrap();
            shared.active = false;
            shared.task.take()
        };
        if let Some(handle) = handle {
            handle.abort();
            tracing::info!("Strategy loop task aborted for shutdown.");
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().unwrap().active
    }

    pub fn status(&self) -> EngineStatus {
        let shared = self.shared.lock().unwrap();
        EngineStatus {
            running: shared.active,
            trades: shared.trade_log.len(),
            poll_errors: shared.poll_errors,
        }
    }

    /// The full trade log, oldest first.
    pub fn trade_log(&self) -> Vec<TradeEvent> {
        self.shared.lock().unwrap().trade_log.clone()
    }

    /// The recent price samples, oldest first, at most `history_size`.
    pub fn price_history(&self) -> Vec<PriceSample> {
        let shared = self.shared.lock().unwrap();
        shared.price_history.iter().cloned().collect()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.shared.lock().unwrap().last_price
    }
}
