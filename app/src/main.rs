// In app/src/main.rs

use anyhow::Result;
use engine::StrategyEngine;
use quote_client::{QuoteClient, QuoteSource};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use web_server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = app_config::load_settings()?;

    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(
        environment = %settings.app.environment,
        symbol = %settings.strategy.symbol,
        "Starting papertrader."
    );

    let quotes: Arc<dyn QuoteSource> = Arc::new(QuoteClient::new(&settings.quote)?);
    let engine = StrategyEngine::new((&settings.strategy).into(), Arc::clone(&quotes));

    let app_state = AppState {
        engine: engine.clone(),
        quotes,
        paper: settings.paper.clone(),
    };

    web_server::run(&settings.server, app_state).await?;

    // The server only returns once the shutdown signal fired; take the
    // strategy loop down with it.
    engine.shutdown();
    tracing::info!("papertrader stopped.");

    Ok(())
}
