// src/main.rs

use dotenvy::dotenv;
use hotels_api::config::Config;
use hotels_api::routes;
use hotels_api::sanitize::AUDIT_TARGET;
use hotels_api::state::AppState;
use tracing_subscriber::{
    EnvFilter, Layer, filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Rejected-HTML audit goes to its own file. The writer drops lines rather
    // than block a request when it falls behind.
    let audit_appender = tracing_appender::rolling::daily(&config.log_dir, "sanitize-audit.log");
    let (audit_writer, _audit_guard) = tracing_appender::non_blocking(audit_appender);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_filter(EnvFilter::new(&config.rust_log));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(EnvFilter::new(&config.rust_log));
    let audit_layer = fmt::layer()
        .with_writer(audit_writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() == AUDIT_TARGET));

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(audit_layer)
        .init();

    // Create AppState, validating every sanitizable payload type up front
    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize HTML sanitizer: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(sanitizer = ?state.sanitizer, "HTML sanitizer ready");

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
