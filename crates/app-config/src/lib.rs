// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, PaperSettings, QuoteSettings, ServerSettings, Settings, StrategySettings,
};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `config/base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables (e.g., `APP_SERVER__PORT=9000`).
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::with_name("config/base"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let settings: Settings = Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.strategy.symbol, "BTC-USD");
        assert_eq!(settings.strategy.poll_interval_secs, 10);
        assert!((settings.strategy.threshold - 0.02).abs() < f64::EPSILON);
        assert_eq!(settings.strategy.history_size, 100);
        assert_eq!(settings.quote.request_timeout_secs, 10);
    }

    #[test]
    fn sections_override_individually() {
        let settings: Settings = Config::builder()
            .add_source(config::File::from_str(
                "[strategy]\nsymbol = \"eth-usd\"\nthreshold = 0.05\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.strategy.symbol, "eth-usd");
        assert!((settings.strategy.threshold - 0.05).abs() < f64::EPSILON);
        // Untouched fields keep their defaults.
        assert_eq!(settings.strategy.poll_interval_secs, 10);
        assert_eq!(settings.server.port, 8000);
    }
}
