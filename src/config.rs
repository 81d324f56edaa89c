use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "quote-gateway")]
#[command(about = "Read-only JSON API over a bundled quote collection")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    // Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // Quotes JSON file, the bundled collection is used when omitted
    #[arg(short, long, env = "QUOTES_FILE")]
    pub quotes_file: Option<PathBuf>,

    // Upper bound for ?perPage=
    #[arg(long, env = "MAX_PER_PAGE", default_value_t = 100,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_per_page: u32,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_MAX_REQUESTS", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in milliseconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_MS", default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window_ms: u64,

    // Add X-RateLimit-* headers to accepted responses
    #[arg(long, env = "RATE_LIMIT_HEADERS", default_value_t = true, action = ArgAction::Set)]
    pub rate_headers: bool,

    // Path prefixes subject to rate limiting (comma-separated)
    #[arg(long, env = "RATE_LIMIT_PATHS", value_delimiter = ',', default_value = "/api/")]
    pub rate_paths: Vec<String>,

    // Tracked clients before an eager sweep kicks in
    #[arg(long, env = "RATE_LIMIT_MAX_CLIENTS", default_value_t = 10_000)]
    pub max_tracked_clients: usize,

    // Seconds between sweeps of expired rate limit entries
    #[arg(long, env = "RATE_LIMIT_SWEEP_SECS", default_value_t = 3600,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,

    // Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub json_logs: bool,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit,
            window: Duration::from_millis(self.rate_window_ms),
            emit_headers: self.rate_headers,
            path_prefixes: self
                .rate_paths
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            max_tracked_clients: self.max_tracked_clients,
        }
    }

    pub fn sweep_every(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}
