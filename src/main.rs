// src/main.rs
use pallet_fit::api::{self, ApiState};
use pallet_fit::config::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pallet_fit=info";

#[tokio::main]
async fn main() {
    // Loaded before the subscriber so RUST_LOG may come from .env.
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(err) = dotenv_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let calculator_config = app_config.calculator.calculator_config();

    info!("🚀 Pallet fit service starting...");
    api::start_api_server(api_config, ApiState::in_memory(calculator_config)).await;
}
