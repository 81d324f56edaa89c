mod fallback;
mod health;
mod metrics;
mod quotes;

pub use fallback::{method_not_allowed, not_found, preflight};
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use quotes::{get_quote, list_quotes, random_quote};
