// In crates/web-server/src/lib.rs

use app_config::{PaperSettings, ServerSettings};
use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
};
use core_types::{PriceSample, Symbol};
use engine::{StartOutcome, StrategyEngine};
use quote_client::QuoteSource;
use std::sync::Arc;
use tokio::net::TcpListener;

pub mod error;
pub mod types;

use types::{
    BalanceResponse, BannerResponse, LifecycleResponse, LogsResponse, PriceResponse,
    SeriesParams, StatusResponse, TradeReceipt, TradeRequest,
};

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: StrategyEngine,
    pub quotes: Arc<dyn QuoteSource>,
    pub paper: PaperSettings,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // Wide-open CORS so the dashboard can connect from anywhere. This is a
    // dev posture; restrict the origin before exposing the service.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/price/{symbol}", get(get_price_handler))
        .route("/buy", post(buy_handler))
        .route("/sell", post(sell_handler))
        .route("/strategy/start", post(start_strategy_handler))
        .route("/strategy/stop", post(stop_strategy_handler))
        .route("/status", get(get_status_handler))
        .route("/logs", get(get_logs_handler))
        .route("/price-history", get(get_price_history_handler))
        .route("/price-history/{symbol}", get(get_provider_history_handler))
        .route("/balance", get(get_balance_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Liveness banner.
async fn root_handler() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Simulated trading API running",
    })
}

/// Handler for `GET /price/:symbol`.
///
/// Fetches the latest closing price from the quote provider, rounded to
/// 2 decimals for display. Lookup failures come back as a 400 with the
/// provider's message.
async fn get_price_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PriceResponse>> {
    let symbol = Symbol::new(&symbol);
    tracing::info!(symbol = %symbol, "Fetching price.");

    let price = state.quotes.latest_price(&symbol).await?;

    Ok(Json(PriceResponse {
        symbol: symbol.to_string(),
        price: quote_client::round2(price),
    }))
}

/// Handler for `POST /buy`. A pure echo; nothing is executed.
async fn buy_handler(Json(trade): Json<TradeRequest>) -> Json<TradeReceipt> {
    let symbol = Symbol::new(&trade.symbol);
    tracing::info!(symbol = %symbol, amount = trade.amount, "Simulated BUY.");

    Json(TradeReceipt {
        action: "buy",
        symbol: symbol.to_string(),
        amount: trade.amount,
        status: "simulated",
    })
}

/// Handler for `POST /sell`. A pure echo; nothing is executed.
async fn sell_handler(Json(trade): Json<TradeRequest>) -> Json<TradeReceipt> {
    let symbol = Symbol::new(&trade.symbol);
    tracing::info!(symbol = %symbol, amount = trade.amount, "Simulated SELL.");

    Json(TradeReceipt {
        action: "sell",
        symbol: symbol.to_string(),
        amount: trade.amount,
        status: "simulated",
    })
}

/// Handler for `POST /strategy/start`.
async fn start_strategy_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    let status = match state.engine.start() {
        StartOutcome::Started => "bot started",
        StartOutcome::AlreadyRunning => "already running",
    };
    Json(LifecycleResponse { status })
}

/// Handler for `POST /strategy/stop`. Idempotent.
async fn stop_strategy_handler(State(state): State<AppState>) -> Json<LifecycleResponse> {
    state.engine.stop();
    Json(LifecycleResponse {
        status: "bot stopped",
    })
}

/// Handler for `GET /status`.
async fn get_status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    let status = state.engine.status();
    Json(StatusResponse {
        bot: if status.running { "running" } else { "idle" },
        trades: status.trades,
    })
}

/// Handler for `GET /logs`. The full trade log, oldest first.
async fn get_logs_handler(State(state): State<AppState>) -> Json<LogsResponse> {
    Json(LogsResponse {
        log: state.engine.trade_log(),
    })
}

/// Handler for `GET /price-history`. The loop's recent samples, oldest
/// first, bounded by the ring capacity.
async fn get_price_history_handler(State(state): State<AppState>) -> Json<Vec<PriceSample>> {
    Json(state.engine.price_history())
}

/// Handler for `GET /price-history/:symbol`.
///
/// The provider's own series for an arbitrary symbol, for charting.
async fn get_provider_history_handler(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<SeriesParams>,
) -> Result<Json<Vec<PriceSample>>> {
    let symbol = Symbol::new(&symbol);
    let series = state
        .quotes
        .price_series(&symbol, &params.range, &params.interval)
        .await?;
    Ok(Json(series))
}

/// Handler for `GET /balance`. The fixed simulated paper balance.
async fn get_balance_handler(State(state): State<AppState>) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        usd: state.paper.usd,
        btc: state.paper.btc,
    })
}

/// The main entry point for running the web server.
///
/// Binds the TCP listener and serves the application router until the
/// process receives a shutdown signal.
pub async fn run(settings: &ServerSettings, app_state: AppState) -> Result<()> {
    let app = create_router(app_state);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::ServerError)?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use engine::EngineSettings;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    /// A provider stub that always reports one price, or always fails.
    enum FakeQuotes {
        Price(f64),
        Unavailable(&'static str),
    }

    impl FakeQuotes {
        fn failure(msg: &'static str) -> quote_client::Error {
            quote_client::Error::Provider {
                code: "Not Found".to_string(),
                description: msg.to_string(),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FakeQuotes {
        async fn latest_price(&self, _symbol: &Symbol) -> quote_client::Result<f64> {
            match self {
                FakeQuotes::Price(price) => Ok(*price),
                FakeQuotes::Unavailable(msg) => Err(Self::failure(msg)),
            }
        }

        async fn price_series(
            &self,
            _symbol: &Symbol,
            _range: &str,
            _interval: &str,
        ) -> quote_client::Result<Vec<PriceSample>> {
            match self {
                FakeQuotes::Price(price) => Ok(vec![
                    PriceSample {
                        time: "10:00:00".to_string(),
                        price: *price,
                    },
                    PriceSample {
                        time: "10:01:00".to_string(),
                        price: *price + 1.0,
                    },
                ]),
                FakeQuotes::Unavailable(msg) => Err(Self::failure(msg)),
            }
        }
    }

    /// A provider stub that replays a script of prices, then fails.
    struct ScriptedQuotes {
        prices: Mutex<VecDeque<f64>>,
    }

    #[async_trait]
    impl QuoteSource for ScriptedQuotes {
        async fn latest_price(&self, symbol: &Symbol) -> quote_client::Result<f64> {
            self.prices
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| quote_client::Error::NoData {
                    symbol: symbol.to_string(),
                })
        }

        async fn price_series(
            &self,
            symbol: &Symbol,
            _range: &str,
            _interval: &str,
        ) -> quote_client::Result<Vec<PriceSample>> {
            Err(quote_client::Error::NoData {
                symbol: symbol.to_string(),
            })
        }
    }

    fn test_state(quotes: Arc<dyn QuoteSource>) -> AppState {
        let settings = EngineSettings {
            symbol: Symbol::new("BTC-USD"),
            poll_interval: Duration::from_secs(3600),
            threshold: 0.02,
            history_size: 100,
        };
        AppState {
            engine: StrategyEngine::new(settings, Arc::clone(&quotes)),
            quotes,
            paper: PaperSettings::default(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, value)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        send(
            app,
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_empty(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        send(
            app,
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    #[tokio::test]
    async fn banner_is_served_at_root() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(1.0))));
        let (status, body) = get_json(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Simulated trading API running");
    }

    #[tokio::test]
    async fn price_is_rounded_and_symbol_uppercased() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(150.004))));
        let (status, body) = get_json(&app, "/price/aapl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["price"], 150.0);
    }

    #[tokio::test]
    async fn price_lookup_failure_is_a_client_error() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Unavailable(
            "No data found, symbol may be delisted",
        ))));
        let (status, body) = get_json(&app, "/price/INVALID").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["detail"]
                .as_str()
                .unwrap()
                .contains("No data found")
        );
    }

    #[tokio::test]
    async fn buy_and_sell_echo_the_request() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(1.0))));

        let (status, body) = post_json(
            &app,
            "/buy",
            serde_json::json!({"symbol": "eth-usd", "amount": -2.5}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "action": "buy",
                "symbol": "ETH-USD",
                "amount": -2.5,
                "status": "simulated"
            })
        );

        // Zero amounts are accepted and echoed; there is no validation.
        let (status, body) = post_json(
            &app,
            "/sell",
            serde_json::json!({"symbol": "AAPL", "amount": 0.0}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "sell");
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["amount"], 0.0);
    }

    #[tokio::test]
    async fn malformed_trade_body_is_rejected_before_core_logic() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(1.0))));
        let (status, _) = post_json(&app, "/buy", serde_json::json!({"symbol": "AAPL"})).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn lifecycle_endpoints_drive_the_engine() {
        let state = test_state(Arc::new(FakeQuotes::Price(100.0)));
        let app = create_router(state.clone());

        let (_, body) = post_empty(&app, "/strategy/start").await;
        assert_eq!(body["status"], "bot started");

        let (_, body) = post_empty(&app, "/strategy/start").await;
        assert_eq!(body["status"], "already running");

        let (_, body) = get_json(&app, "/status").await;
        assert_eq!(body["bot"], "running");

        let (_, body) = post_empty(&app, "/strategy/stop").await;
        assert_eq!(body["status"], "bot stopped");

        // Stopping again is fine.
        let (_, body) = post_empty(&app, "/strategy/stop").await;
        assert_eq!(body["status"], "bot stopped");

        let (_, body) = get_json(&app, "/status").await;
        assert_eq!(body["bot"], "idle");

        state.engine.shutdown();
    }

    #[tokio::test]
    async fn status_logs_and_history_reflect_engine_state() {
        let state = test_state(Arc::new(ScriptedQuotes {
            prices: Mutex::new(VecDeque::from([100.0, 97.9])),
        }));
        let app = create_router(state.clone());

        // Two polls: the second drops 2.1% and records a BUY.
        state.engine.poll_once().await;
        state.engine.poll_once().await;

        let (_, body) = get_json(&app, "/status").await;
        assert_eq!(body["bot"], "idle");
        assert_eq!(body["trades"], 1);

        let (_, body) = get_json(&app, "/logs").await;
        let log = body["log"].as_array().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0]["action"], "BUY");
        assert_eq!(log[0]["price"], 97.9);

        let (_, body) = get_json(&app, "/price-history").await;
        let history = body.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["price"], 100.0);
        assert_eq!(history[1]["price"], 97.9);
    }

    #[tokio::test]
    async fn provider_series_endpoint_returns_points() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(42.0))));
        let (status, body) = get_json(&app, "/price-history/btc-usd?range=1d&interval=1m").await;
        assert_eq!(status, StatusCode::OK);
        let points = body.as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["price"], 42.0);

        let failing = create_router(test_state(Arc::new(FakeQuotes::Unavailable(
            "No data found, symbol may be delisted",
        ))));
        let (status, _) = get_json(&failing, "/price-history/btc-usd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn balance_reports_the_paper_balance() {
        let app = create_router(test_state(Arc::new(FakeQuotes::Price(1.0))));
        let (status, body) = get_json(&app, "/balance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["usd"], 10_000.0);
        assert_eq!(body["btc"], 0.0);
    }
}
