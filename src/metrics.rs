use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("quote_api_requests_total", "Total number of rate limited API requests seen").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("quote_api_rate_limited_total", "Requests rejected with 429").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "quote_api_request_latency_seconds",
        "API request latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("quote_api_tracked_clients", "Clients currently tracked by the rate limiter").unwrap();
    pub static ref SWEPT_ENTRIES: Counter =
        register_counter!("quote_api_swept_entries_total", "Expired rate limit entries removed by the sweeper").unwrap();
    pub static ref QUOTES_LOADED: Gauge =
        register_gauge!("quote_api_quotes_loaded", "Number of quotes in the loaded collection").unwrap();
}
