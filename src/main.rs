use clap::Parser; // for cli
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quote_gateway::config::Args;
use quote_gateway::metrics::QUOTES_LOADED;
use quote_gateway::rate_limit::sweeper;
use quote_gateway::{AppState, QuoteRepository, RateLimiter, StartupError, build_router};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(args.json_logs);

    if let Err(e) = run(args).await {
        error!(error = %e, "Gateway stopped");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), StartupError> {
    let quotes = match &args.quotes_file {
        Some(path) => QuoteRepository::from_file(path)?,
        None => QuoteRepository::bundled()?,
    }
    .with_max_per_page(args.max_per_page as usize);
    QUOTES_LOADED.set(quotes.len() as f64);

    let source = match &args.quotes_file {
        Some(path) => path.display().to_string(),
        None => "bundled".to_string(),
    };
    info!(quotes = quotes.len(), source = %source, "Quote collection loaded");

    let rate_config = args.rate_limit_config();
    info!(
        max_requests = rate_config.max_requests,
        window_ms = args.rate_window_ms,
        paths = ?rate_config.path_prefixes,
        "Rate limit configured"
    );

    let rate_limiter = Arc::new(RateLimiter::new(rate_config));

    // spawn the background sweeper
    tokio::spawn(sweeper(Arc::clone(&rate_limiter), args.sweep_every()));

    let state = Arc::new(AppState {
        quotes,
        rate_limiter,
    });
    let app = build_router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!("Gateway running on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
