//! Herald server binary.

use std::sync::Arc;

use axum::http::Request;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use herald::{router, scheduler, AppState, Config, TierRegistry};

/// Scheduled LLM content relay.
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Scheduled LLM content relay with tiered model fallback", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let refresh_interval = config.refresh_interval;

    let registry = TierRegistry::from_env()?;
    let state = AppState::new(config, registry)?;

    scheduler::spawn(Arc::clone(&state.refresher), refresh_interval);

    let app = router(state).layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }),
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting server");

    axum::serve(listener, app).await?;

    Ok(())
}
